#![cfg(feature = "live_gemini")]

use anyhow::Result;
use llm_optimizer::{Config, GeminiClient, Status, Workflow};
use std::sync::Arc;

#[tokio::test]
async fn test_live_workflow_run() -> Result<()> {
    if std::env::var("RUN_GEMINI_TESTS").is_err() {
        eprintln!("Skipping live Gemini test - set RUN_GEMINI_TESTS=1 to run");
        return Ok(());
    }

    let config = Config::load()?;
    let client = GeminiClient::from_config(&config)?;
    let mut workflow = Workflow::new(Arc::new(client), config.workflow.clone());

    let status = workflow.start("CRM software").await?;
    let snapshot = workflow.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    assert_eq!(status, Status::Complete);
    assert!(!snapshot.simulation.unwrap().providers.is_empty());

    Ok(())
}
