use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::clients::traits::{ModelCapability, ModelError};
use crate::config::Config;
use crate::contracts::Contract;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Gemini `generateContent` client with structured (JSON) output.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ModelError::MissingCredential);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    /// Build a client from the loaded configuration. The credential is read
    /// once here and never changes afterwards.
    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        let api_key = config
            .runtime
            .api_key
            .clone()
            .ok_or(ModelError::MissingCredential)?;
        Self::new(
            api_key,
            config.gemini.model.clone(),
            config.gemini.base_url.clone(),
            Duration::from_millis(config.gemini.timeout_ms),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

fn build_request<'a>(prompt: &'a str, contract: &'a Contract, temperature: f32) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: &contract.schema,
            temperature,
        },
    }
}

/// Concatenated text of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, ModelError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl ModelCapability for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        contract: &Contract,
        temperature: f32,
    ) -> Result<String, ModelError> {
        debug!(
            "Calling Gemini (model={}, contract={}, chars={})",
            self.model,
            contract.name,
            prompt.len()
        );

        let body = build_request(prompt, contract, temperature);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_text(parsed)
    }
}
