use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use llm_optimizer::{Config, GeminiClient, Language, Snapshot, Status, Workflow};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate intercepted LLM search traffic for a keyword and derive an LLM-SEO strategy", long_about = None)]
struct Args {
    /// Keyword or topic to analyse
    keyword: String,

    /// Output language for prompts and results (en, de)
    #[arg(long)]
    language: Option<Language>,

    /// Validate the strategy report against its contract
    #[arg(long)]
    strict: bool,

    /// Print every state snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn render(snapshot: &Snapshot, json: bool, language: Language) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    let keyword = snapshot.keyword.as_deref().unwrap_or_default();
    match snapshot.status {
        Status::Idle => {}
        Status::Simulating => println!("> intercepting traffic for \"{}\"...", keyword),
        Status::Analyzing => println!("> processing extracted data..."),
        Status::Complete => println!("> analysis complete"),
        Status::Error => println!("> failed: {}", snapshot.error.as_deref().unwrap_or_default()),
    }

    if let Some(sim) = &snapshot.simulation
        && snapshot.status == Status::Analyzing
    {
        println!("  intent: {}", sim.detected_intent);
        for provider in &sim.providers {
            println!("  [{}] {}ms", provider.name, provider.latency);
            for q in &provider.intercepted_queries {
                println!("    - {}", q);
            }
        }
        for (key, value) in &sim.metadata {
            println!("  {}: {}", key, value);
        }
    }

    if let Some(report) = &snapshot.report {
        println!("\n{}\n", report.executive_summary);
        for factor in &report.ranking_factors {
            let score = factor
                .score
                .map(|s| format!("{:>5.1}", s))
                .unwrap_or_else(|| "    -".to_string());
            println!("  {}  {}: {}", score, factor.name, factor.description);
        }
        for cluster in &report.keyword_clusters {
            println!("  # {}: {}", cluster.topic, cluster.keywords.join(", "));
        }
        for step in &report.action_plan {
            println!(
                "  * {} [{}/{}] {}",
                step.title,
                step.priority.map_or("-", |p| p.label(language)),
                step.effort.map_or("-", |e| e.label(language)),
                step.description
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.runtime.log_level)
                .unwrap_or_else(|_| EnvFilter::new("llm_optimizer=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(language) = args.language {
        config.workflow.language = language;
    }
    if args.strict {
        config.workflow.strict_report = true;
    }

    let client = GeminiClient::from_config(&config).context("Failed to build Gemini client")?;
    info!("Using model {}", client.model());

    let mut workflow = Workflow::new(Arc::new(client), config.workflow.clone());
    let mut updates = workflow.subscribe();
    let json = args.json;
    let language = config.workflow.language;
    let renderer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(snapshot) => {
                    if let Err(e) = render(&snapshot, json, language) {
                        eprintln!("render error: {}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("Renderer skipped {} snapshots", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let status = workflow.start(&args.keyword).await?;
    let final_snapshot = workflow.snapshot();
    drop(workflow);
    renderer.await.context("renderer task panicked")?;

    match status {
        Status::Complete => Ok(()),
        Status::Idle => bail!("keyword must not be empty"),
        _ => bail!(final_snapshot.error.unwrap_or_default()),
    }
}
