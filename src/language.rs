//! Output language for prompts, contract descriptions and user-facing messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[serde(alias = "english")]
    En,
    #[serde(alias = "german", alias = "deutsch")]
    De,
}

impl Language {
    /// Shown when the simulation call fails or returns unparseable content.
    pub fn simulation_failure(self) -> &'static str {
        match self {
            Language::En => "Failed to simulate network traffic.",
            Language::De => "Fehler bei der Simulation des Netzwerkverkehrs.",
        }
    }

    /// Shown when the analysis call fails or returns unparseable content.
    pub fn analysis_failure(self) -> &'static str {
        match self {
            Language::En => "Failed to generate the strategy report.",
            Language::De => "Fehler bei der Erstellung des Strategieberichts.",
        }
    }

    /// Sentinel for a missing `detectedIntent`.
    pub fn unknown_intent(self) -> &'static str {
        match self {
            Language::En => "unknown",
            Language::De => "Unbekannt",
        }
    }

    /// Instruction appended to every prompt so the model answers in this language.
    pub fn answer_instruction(self) -> &'static str {
        match self {
            Language::En => "Answer strictly in English.",
            Language::De => "Antworte ausschliesslich auf Deutsch.",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::De => "German",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::De => write!(f, "de"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "de" | "german" | "deutsch" => Ok(Language::De),
            other => Err(format!("unsupported language '{}' (expected en or de)", other)),
        }
    }
}
