pub mod clients;
pub mod config;
pub mod contracts;
pub mod error;
pub mod language;
pub mod prompts;
pub mod stages;
pub mod types;
pub mod workflow;

pub use clients::{GeminiClient, ModelCapability, ModelError, ScriptedModel};
pub use config::Config;
pub use error::{OptimizerError, Result};
pub use language::Language;
pub use types::{SimulationData, StrategyReport};
pub use workflow::{RunState, Snapshot, Status, Workflow};
