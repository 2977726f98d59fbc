use std::ops::Range;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::clients::ModelCapability;
use crate::config::WorkflowConfig;
use crate::contracts::{SIMULATION_TEMPERATURE, simulation_contract};
use crate::error::{OptimizerError, Result};
use crate::language::Language;
use crate::prompts::simulation_prompt;
use crate::stages::parse_model_json;
use crate::types::{
    InsightStatus, Metadata, ProviderInsight, ProviderName, SignalValue, SimulationData,
    default_metadata,
};

/// Synthesized provider latency, in milliseconds.
pub const LATENCY_RANGE_MS: Range<u32> = 100..500;

/// Run the simulation stage for one keyword.
///
/// The keyword is trimmed; an empty keyword is rejected before the model is
/// called. Any model or parse failure surfaces as a `Simulation` error with
/// the fixed user-facing message, the cause is only logged.
pub async fn simulate<M>(model: &M, keyword: &str, config: &WorkflowConfig) -> Result<SimulationData>
where
    M: ModelCapability + ?Sized,
{
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(OptimizerError::InvalidInput {
            message: "keyword must not be empty".to_string(),
        });
    }

    let language = config.language;
    let failure = || OptimizerError::Simulation {
        message: language.simulation_failure().to_string(),
    };

    let contract = simulation_contract(language);
    let prompt = simulation_prompt(keyword, language);
    debug!("Simulation prompt for '{}': {} chars", keyword, prompt.len());

    let text = model
        .generate(&prompt, &contract, SIMULATION_TEMPERATURE)
        .await
        .map_err(|e| {
            error!("Simulation error: {}", e);
            failure()
        })?;

    let raw = parse_model_json(&text).map_err(|e| {
        error!("Simulation error: response is not JSON: {}", e);
        failure()
    })?;

    let missing = contract.missing_required(&raw);
    if !missing.is_empty() {
        debug!("Simulation response missing {:?}; using defaults", missing);
    }

    let mut rng = rand::thread_rng();
    Ok(normalize_simulation(keyword, &raw, language, Utc::now(), &mut rng))
}

/// Turn a parsed simulation response into a `SimulationData`, filling every
/// absent or malformed field from the documented defaults.
pub fn normalize_simulation<R: Rng + ?Sized>(
    keyword: &str,
    raw: &Value,
    language: Language,
    timestamp: DateTime<Utc>,
    rng: &mut R,
) -> SimulationData {
    if !raw.is_object() {
        warn!("Simulation response is not a JSON object; using defaults for every field");
    }

    SimulationData {
        target_keyword: keyword.to_string(),
        timestamp,
        providers: normalize_providers(raw.get("providers"), rng),
        detected_intent: raw
            .get("detectedIntent")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(language.unknown_intent())
            .to_string(),
        metadata: normalize_metadata(raw.get("metadata"), language),
    }
}

fn normalize_providers<R: Rng + ?Sized>(raw: Option<&Value>, rng: &mut R) -> Vec<ProviderInsight> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        if raw.is_some_and(|v| !v.is_null()) {
            debug!("Malformed providers field; using empty list");
        }
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let label = entry.get("name").and_then(Value::as_str).unwrap_or_default();
            let name = match label.parse::<ProviderName>() {
                Ok(name) => name,
                Err(e) => {
                    warn!("Dropping provider entry: {}", e);
                    return None;
                }
            };
            let intercepted_queries = entry
                .get("interceptedQueries")
                .and_then(Value::as_array)
                .map(|qs| {
                    qs.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(ProviderInsight {
                name,
                intercepted_queries,
                status: InsightStatus::Intercepted,
                latency: rng.gen_range(LATENCY_RANGE_MS),
            })
        })
        .collect()
}

fn normalize_metadata(raw: Option<&Value>, language: Language) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(obj) = raw.and_then(Value::as_object) {
        for (key, value) in obj {
            let signal = match value {
                Value::String(s) => SignalValue::Text(s.clone()),
                Value::Number(n) => match n.as_f64() {
                    Some(n) => SignalValue::Number(n),
                    None => continue,
                },
                _ => {
                    debug!("Ignoring metadata signal '{}' of unsupported type", key);
                    continue;
                }
            };
            metadata.insert(key.clone(), signal);
        }
    }
    for (key, default) in default_metadata(language) {
        metadata.entry(key).or_insert(default);
    }
    metadata
}
