use std::sync::Arc;

use llm_optimizer::config::WorkflowConfig;
use llm_optimizer::stages::simulation::LATENCY_RANGE_MS;
use llm_optimizer::types::{InsightStatus, ProviderName, default_metadata};
use llm_optimizer::{Language, OptimizerError, RunState, ScriptedModel, Snapshot, Status, Workflow};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

fn crm_simulation() -> Value {
    json!({
        "providers": [
            { "name": "ChatGPT", "interceptedQueries": ["best CRM for small teams"] }
        ],
        "detectedIntent": "transactional",
        "metadata": { "priceSensitivity": "Medium", "technicalDepth": "Low", "reviewImportance": 70 }
    })
}

fn crm_report() -> Value {
    json!({
        "executiveSummary": "Win comparison and pricing queries.",
        "rankingFactors": [
            { "name": "Review volume", "score": 85, "description": "Models cite review aggregates." },
            { "name": "Pricing transparency", "score": 60, "description": "Public price pages." }
        ],
        "keywordClusters": [
            { "topic": "Small business", "keywords": ["crm small team", "simple crm"] }
        ],
        "actionPlan": [
            { "title": "Publish pricing", "description": "One page with all tiers.", "priority": "High", "effort": "Easy" }
        ]
    })
}

fn workflow(model: &Arc<ScriptedModel>) -> Workflow {
    Workflow::new(model.clone(), WorkflowConfig::default())
}

#[tokio::test]
async fn crm_software_run_completes() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(crm_report()),
    );
    let mut wf = workflow(&model);

    let status = wf.start("CRM software").await.unwrap();
    assert_eq!(status, Status::Complete);

    let snap = wf.snapshot();
    let sim = snap.simulation.expect("simulation kept on completion");
    assert_eq!(sim.target_keyword, "CRM software");
    assert_eq!(sim.detected_intent, "transactional");
    assert_eq!(sim.providers.len(), 1);
    assert_eq!(sim.providers[0].name, ProviderName::ChatGpt);
    assert_eq!(sim.providers[0].status, InsightStatus::Intercepted);
    assert!(LATENCY_RANGE_MS.contains(&sim.providers[0].latency));

    let report = snap.report.expect("report present on completion");
    assert!(!report.ranking_factors.is_empty());
    assert!(
        report
            .ranking_factors
            .iter()
            .all(|f| f.score.is_some_and(|s| (0.0..=100.0).contains(&s)))
    );
    assert!(snap.error.is_none());

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].contract, "simulation");
    assert_eq!(calls[1].contract, "analysis");
    assert!(calls[1].prompt.contains("best CRM for small teams"));
}

#[tokio::test]
async fn keyword_is_trimmed_before_use() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(crm_report()),
    );
    let mut wf = workflow(&model);

    wf.start("  CRM software \n").await.unwrap();
    let snap = wf.snapshot();
    assert_eq!(snap.keyword.as_deref(), Some("CRM software"));
    assert_eq!(snap.simulation.unwrap().target_keyword, "CRM software");
}

#[tokio::test]
async fn whitespace_keyword_is_a_noop() {
    let model = Arc::new(ScriptedModel::new());
    let mut wf = workflow(&model);

    for keyword in ["", "   ", "\t\n"] {
        assert_eq!(wf.start(keyword).await.unwrap(), Status::Idle);
    }
    assert_eq!(wf.snapshot(), Snapshot::idle());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn simulation_failure_ends_in_error_without_data() {
    let model = Arc::new(ScriptedModel::new().fail("quota exceeded"));
    let mut wf = workflow(&model);

    assert_eq!(wf.start("CRM software").await.unwrap(), Status::Error);
    let snap = wf.snapshot();
    assert_eq!(
        snap.error.as_deref(),
        Some(Language::En.simulation_failure())
    );
    assert!(snap.simulation.is_none());
    assert!(matches!(
        wf.state(),
        RunState::Failed { simulation: None, .. }
    ));
    // analysis never ran
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn unparseable_simulation_is_a_simulation_error() {
    let model = Arc::new(ScriptedModel::new().respond("I cannot help with that."));
    let mut wf = workflow(&model);

    assert_eq!(wf.start("CRM software").await.unwrap(), Status::Error);
    assert_eq!(
        wf.snapshot().error.as_deref(),
        Some("Failed to simulate network traffic.")
    );
}

#[tokio::test]
async fn analysis_failure_is_not_promoted_to_complete() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .fail("upstream 503"),
    );
    let mut wf = workflow(&model);

    assert_eq!(wf.start("CRM software").await.unwrap(), Status::Error);
    let snap = wf.snapshot();
    assert_eq!(snap.error.as_deref(), Some(Language::En.analysis_failure()));
    assert!(snap.report.is_none());
    assert!(snap.simulation.is_none());

    // still inspectable by the owner until reset
    match wf.state() {
        RunState::Failed {
            simulation: Some(sim),
            ..
        } => assert_eq!(sim.target_keyword, "CRM software"),
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn reset_restores_initial_state_and_is_idempotent() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(crm_report())
            .fail("boom"),
    );
    let mut wf = workflow(&model);

    wf.start("CRM software").await.unwrap();
    assert_eq!(wf.status(), Status::Complete);
    wf.reset();
    assert_eq!(wf.snapshot(), Snapshot::idle());
    wf.reset();
    assert_eq!(wf.snapshot(), Snapshot::idle());

    wf.start("tents").await.unwrap();
    assert_eq!(wf.status(), Status::Error);
    wf.reset();
    assert_eq!(wf.snapshot(), Snapshot::idle());
    assert!(matches!(wf.state(), RunState::Idle));
}

#[tokio::test]
async fn start_from_terminal_state_requires_reset() {
    let model = Arc::new(ScriptedModel::new().fail("boom"));
    let mut wf = workflow(&model);

    wf.start("CRM software").await.unwrap();
    let err = wf.start("tents").await.unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::InvalidTransition {
            from: Status::Error,
            ..
        }
    ));
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn new_run_discards_previous_records() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(crm_report())
            .respond_json(json!({ "detectedIntent": "informational" }))
            .respond_json(json!({ "executiveSummary": "Second run." })),
    );
    let mut wf = workflow(&model);

    wf.start("CRM software").await.unwrap();
    let first_run = wf.snapshot().run_id;
    wf.reset();
    wf.start("camping tents").await.unwrap();

    let snap = wf.snapshot();
    assert_ne!(snap.run_id, first_run);
    let sim = snap.simulation.unwrap();
    assert_eq!(sim.target_keyword, "camping tents");
    assert!(sim.providers.is_empty());
    assert_eq!(sim.metadata, default_metadata(Language::En));
    let report = snap.report.unwrap();
    assert_eq!(report.executive_summary, "Second run.");
    assert!(report.ranking_factors.is_empty());
}

fn collect_statuses(mut updates: broadcast::Receiver<Snapshot>) -> JoinHandle<Vec<Status>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(snapshot) = updates.recv().await {
            seen.push(snapshot.status);
        }
        seen
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribers_observe_every_transition() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(crm_report()),
    );
    let mut wf = workflow(&model);
    let seen = collect_statuses(wf.subscribe());

    wf.start("CRM software").await.unwrap();
    wf.reset();
    drop(wf);

    assert_eq!(
        seen.await.unwrap(),
        vec![
            Status::Simulating,
            Status::Analyzing,
            Status::Complete,
            Status::Idle
        ]
    );
}

#[tokio::test]
async fn analyzing_snapshot_carries_the_simulation() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(crm_report()),
    );
    let mut wf = workflow(&model);
    let mut updates = wf.subscribe();

    wf.start("CRM software").await.unwrap();

    assert_eq!(updates.recv().await.unwrap().status, Status::Simulating);
    let analyzing = updates.recv().await.unwrap();
    assert_eq!(analyzing.status, Status::Analyzing);
    assert_eq!(
        analyzing.simulation.unwrap().detected_intent,
        "transactional"
    );
    assert!(analyzing.report.is_none());
    let complete = updates.recv().await.unwrap();
    assert_eq!(complete, wf.snapshot());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_run_is_observed_as_simulating_then_error() {
    let model = Arc::new(ScriptedModel::new().fail("quota exceeded"));
    let mut wf = workflow(&model);
    let seen = collect_statuses(wf.subscribe());

    wf.start("CRM software").await.unwrap();
    drop(wf);

    assert_eq!(seen.await.unwrap(), vec![Status::Simulating, Status::Error]);
}

#[tokio::test]
async fn unparseable_analysis_is_an_analysis_error() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond("Sorry, no."),
    );
    let mut wf = workflow(&model);

    assert_eq!(wf.start("CRM software").await.unwrap(), Status::Error);
    let snap = wf.snapshot();
    assert_eq!(snap.error.as_deref(), Some(Language::En.analysis_failure()));
    assert!(snap.report.is_none());
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn null_and_incomplete_report_fields_complete_the_run() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(json!({
                "executiveSummary": null,
                "rankingFactors": [{ "name": "Reviews" }],
                "keywordClusters": null,
                "actionPlan": [{ "title": "Publish pricing" }]
            })),
    );
    let mut wf = workflow(&model);

    assert_eq!(wf.start("CRM software").await.unwrap(), Status::Complete);
    let report = wf.snapshot().report.unwrap();
    assert!(report.executive_summary.is_empty());
    assert_eq!(report.ranking_factors[0].score, None);
    assert!(report.keyword_clusters.is_empty());
    assert_eq!(report.action_plan[0].priority, None);
    assert_eq!(report.action_plan[0].effort, None);
}

#[tokio::test]
async fn strict_mode_turns_contract_gaps_into_errors() {
    let model = Arc::new(
        ScriptedModel::new()
            .respond_json(crm_simulation())
            .respond_json(json!({ "executiveSummary": "Only a summary." })),
    );
    let config = WorkflowConfig {
        strict_report: true,
        ..WorkflowConfig::default()
    };
    let mut wf = Workflow::new(model.clone(), config);

    assert_eq!(wf.start("CRM software").await.unwrap(), Status::Error);
    assert_eq!(
        wf.snapshot().error.as_deref(),
        Some(Language::En.analysis_failure())
    );
}

#[tokio::test]
async fn german_run_uses_german_messages() {
    let model = Arc::new(ScriptedModel::new().fail("boom"));
    let config = WorkflowConfig {
        language: Language::De,
        ..WorkflowConfig::default()
    };
    let mut wf = Workflow::new(model.clone(), config);

    wf.start("Veganes Proteinpulver").await.unwrap();
    assert_eq!(
        wf.snapshot().error.as_deref(),
        Some("Fehler bei der Simulation des Netzwerkverkehrs.")
    );
    assert!(model.calls()[0].prompt.contains("Antworte ausschliesslich auf Deutsch."));
}
