use async_trait::async_trait;
use thiserror::Error;

use crate::contracts::Contract;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingCredential,
    #[error("http error: {0}")]
    Http(String),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no text")]
    EmptyResponse,
    #[error("scripted failure: {0}")]
    Script(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        ModelError::Http(err.to_string())
    }
}

/// The generative-model capability shared by both stages.
///
/// Given a prompt and a contract, returns the raw text the model produced.
/// Parsing that text as JSON is the calling stage's job.
#[async_trait]
pub trait ModelCapability: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        contract: &Contract,
        temperature: f32,
    ) -> Result<String, ModelError>;
}
