//! The two model-backed stages of a run.

pub mod analysis;
pub mod simulation;

pub use analysis::analyze;
pub use simulation::simulate;

use serde_json::Value;

/// Parse model output as JSON, tolerating a surrounding markdown code fence.
pub fn parse_model_json(text: &str) -> serde_json::Result<Value> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed)
}
