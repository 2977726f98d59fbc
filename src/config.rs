use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clients::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_MS};
use crate::error::{OptimizerError, Result};
use crate::language::Language;

/// Main configuration loaded from llm_optimizer.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub workflow: WorkflowConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Model endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    /// Transport timeout for a single generate call
    pub timeout_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Behaviour of the two stages
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub language: Language,
    /// Validate the strategy report against its contract instead of passing it through
    pub strict_report: bool,
}

/// Runtime configuration loaded from environment variables
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Process-wide credential for the model capability; read once at start-up
    pub api_key: Option<String>,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            log_level: "llm_optimizer=info".to_string(),
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self {
            api_key,
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "llm_optimizer=info".to_string()),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses LLM_OPTIMIZER_CONFIG or defaults to "llm_optimizer.toml"
    pub fn load() -> Result<Self> {
        // Environment file: LLM_OPTIMIZER_ENV_FILE if set, else ./.env
        if let Ok(env_path) = std::env::var("LLM_OPTIMIZER_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path = std::env::var("LLM_OPTIMIZER_CONFIG")
            .unwrap_or_else(|_| "llm_optimizer.toml".to_string());

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(_) => {
                tracing::debug!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Ok(url) = std::env::var("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(timeout) = std::env::var("GEMINI_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.gemini.timeout_ms = timeout;
        }
        if let Ok(lang) = std::env::var("LLM_OPTIMIZER_LANGUAGE") {
            self.workflow.language = lang
                .parse()
                .map_err(|message| OptimizerError::Config { message })?;
        }
        if let Some(strict) = env_flag("LLM_OPTIMIZER_STRICT_REPORT") {
            self.workflow.strict_report = strict;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.gemini.model.trim().is_empty() {
            return Err(OptimizerError::Config {
                message: "gemini.model must not be empty".to_string(),
            });
        }
        if self.gemini.timeout_ms == 0 {
            return Err(OptimizerError::Config {
                message: "gemini.timeout_ms must be > 0".to_string(),
            });
        }
        if !self.gemini.base_url.starts_with("http://") && !self.gemini.base_url.starts_with("https://")
        {
            return Err(OptimizerError::Config {
                message: format!("gemini.base_url must be http(s): {}", self.gemini.base_url),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert_eq!(config.workflow.language, Language::En);
        assert!(!config.workflow.strict_report);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [workflow]
            language = "de"
            strict_report = true
            "#,
        )
        .unwrap();
        assert_eq!(config.workflow.language, Language::De);
        assert!(config.workflow.strict_report);
        assert_eq!(config.gemini.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.gemini.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let runtime = RuntimeConfig {
            api_key: Some("secret-key".to_string()),
            log_level: "info".to_string(),
        };
        let printed = format!("{:?}", runtime);
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }
}
