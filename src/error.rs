//! Domain-specific error types for llm-optimizer

use thiserror::Error;

use crate::workflow::Status;

/// Main error type for the simulate-then-analyze workflow
#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Empty or whitespace-only keyword; rejected before any model call.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// User-facing message for a failed simulation stage.
    #[error("{message}")]
    Simulation { message: String },

    /// User-facing message for a failed analysis stage.
    #[error("{message}")]
    Analysis { message: String },

    #[error("Contract violation in {contract}: {message}")]
    ContractViolation { contract: String, message: String },

    #[error("Invalid transition: cannot {operation} while {from}")]
    InvalidTransition {
        operation: &'static str,
        from: Status,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl OptimizerError {
    /// Message suitable for showing to an end user in the terminal error state.
    pub fn user_message(&self) -> String {
        match self {
            OptimizerError::Simulation { message } | OptimizerError::Analysis { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for OptimizerError {
    fn from(err: serde_json::Error) -> Self {
        OptimizerError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for OptimizerError {
    fn from(err: toml::de::Error) -> Self {
        OptimizerError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

/// Result type alias for llm-optimizer operations
pub type Result<T> = std::result::Result<T, OptimizerError>;
