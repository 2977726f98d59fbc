use serde_json::Value;
use tracing::{debug, error};

use crate::clients::ModelCapability;
use crate::config::WorkflowConfig;
use crate::contracts::{ANALYSIS_TEMPERATURE, Contract, analysis_contract};
use crate::error::{OptimizerError, Result};
use crate::prompts::analysis_prompt;
use crate::stages::parse_model_json;
use crate::types::{SimulationData, StrategyReport};

/// Run the analysis stage on a completed simulation.
///
/// By default the parsed report is passed through as the model returned it.
/// With `strict_report` the report is also checked against the analysis
/// contract. Every failure surfaces as an `Analysis` error carrying the fixed
/// user-facing message; there is no retry.
pub async fn analyze<M>(
    model: &M,
    simulation: &SimulationData,
    config: &WorkflowConfig,
) -> Result<StrategyReport>
where
    M: ModelCapability + ?Sized,
{
    let language = config.language;
    let failure = || OptimizerError::Analysis {
        message: language.analysis_failure().to_string(),
    };

    let contract = analysis_contract(language);
    let prompt = analysis_prompt(simulation, language);
    debug!(
        "Analysis prompt for '{}': {} queries, {} chars",
        simulation.target_keyword,
        simulation.flattened_queries().len(),
        prompt.len()
    );

    let text = model
        .generate(&prompt, &contract, ANALYSIS_TEMPERATURE)
        .await
        .map_err(|e| {
            error!("Analysis error: {}", e);
            failure()
        })?;

    let raw = parse_model_json(&text).map_err(|e| {
        error!("Analysis error: response is not JSON: {}", e);
        failure()
    })?;

    let report: StrategyReport = serde_json::from_value(raw.clone()).map_err(|e| {
        error!("Analysis error: response does not match the report shape: {}", e);
        failure()
    })?;

    if config.strict_report {
        validate_report(&contract, &raw, &report).map_err(|e| {
            error!("Analysis error: {}", e);
            failure()
        })?;
    } else {
        let missing = contract.missing_required(&raw);
        if !missing.is_empty() {
            debug!("Report missing {:?}; passing through unchecked", missing);
        }
    }

    Ok(report)
}

/// Strict contract check for a parsed report.
pub fn validate_report(contract: &Contract, raw: &Value, report: &StrategyReport) -> Result<()> {
    let violation = |message: String| OptimizerError::ContractViolation {
        contract: contract.name.to_string(),
        message,
    };

    let missing = contract.missing_required(raw);
    if !missing.is_empty() {
        return Err(violation(format!("missing required fields {:?}", missing)));
    }
    if report.executive_summary.trim().is_empty() {
        return Err(violation("executiveSummary is empty".to_string()));
    }
    for factor in &report.ranking_factors {
        match factor.score {
            None => {
                return Err(violation(format!(
                    "ranking factor '{}' has no score",
                    factor.name
                )));
            }
            Some(score) if !(0.0..=100.0).contains(&score) => {
                return Err(violation(format!(
                    "score {} of ranking factor '{}' is outside [0, 100]",
                    score, factor.name
                )));
            }
            Some(_) => {}
        }
    }
    if let Some(item) = report
        .action_plan
        .iter()
        .find(|i| i.priority.is_none() || i.effort.is_none())
    {
        return Err(violation(format!(
            "action item '{}' lacks priority or effort",
            item.title
        )));
    }
    Ok(())
}
