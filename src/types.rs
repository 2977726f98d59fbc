//! Records produced by the two stages.
//!
//! Both records are immutable once built. The workflow owns them for the
//! duration of a run and hands them out behind `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::language::Language;

/// Metadata signal keys requested from the simulation stage.
pub const PRICE_SENSITIVITY: &str = "priceSensitivity";
pub const TECHNICAL_DEPTH: &str = "technicalDepth";
pub const REVIEW_IMPORTANCE: &str = "reviewImportance";

/// Simulated information sources whose internal queries are fabricated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderName {
    #[serde(rename = "ChatGPT")]
    ChatGpt,
    Gemini,
    Perplexity,
}

impl ProviderName {
    pub const ALL: [ProviderName; 3] = [
        ProviderName::ChatGpt,
        ProviderName::Gemini,
        ProviderName::Perplexity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProviderName::ChatGpt => "ChatGPT",
            ProviderName::Gemini => "Gemini",
            ProviderName::Perplexity => "Perplexity",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProviderName {
    type Err = String;

    /// Exact label match; anything else is outside the provider set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderName::ALL
            .into_iter()
            .find(|p| p.label() == s)
            .ok_or_else(|| format!("unknown provider '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    Intercepted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInsight {
    pub name: ProviderName,
    pub intercepted_queries: Vec<String>,
    pub status: InsightStatus,
    /// Synthesized by the stage, in milliseconds.
    pub latency: u32,
}

/// A metadata signal is either a qualitative label or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Number(n) => write!(f, "{}", n),
            SignalValue::Text(t) => f.write_str(t),
        }
    }
}

pub type Metadata = BTreeMap<String, SignalValue>;

/// The fixed table used to fill missing metadata signals.
pub fn default_metadata(language: Language) -> Metadata {
    let (price, depth) = match language {
        Language::En => ("Medium", "Low"),
        Language::De => ("Mittel", "Niedrig"),
    };
    let mut m = Metadata::new();
    m.insert(
        PRICE_SENSITIVITY.to_string(),
        SignalValue::Text(price.to_string()),
    );
    m.insert(
        TECHNICAL_DEPTH.to_string(),
        SignalValue::Text(depth.to_string()),
    );
    m.insert(REVIEW_IMPORTANCE.to_string(), SignalValue::Number(50.0));
    m
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationData {
    pub target_keyword: String,
    pub timestamp: DateTime<Utc>,
    pub providers: Vec<ProviderInsight>,
    pub detected_intent: String,
    pub metadata: Metadata,
}

impl SimulationData {
    /// Every provider's queries in provider order.
    pub fn flattened_queries(&self) -> Vec<&str> {
        self.providers
            .iter()
            .flat_map(|p| p.intercepted_queries.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(alias = "Hoch")]
    High,
    #[serde(alias = "Mittel")]
    Medium,
    #[serde(alias = "Niedrig")]
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Priority::High, Language::En) => "High",
            (Priority::Medium, Language::En) => "Medium",
            (Priority::Low, Language::En) => "Low",
            (Priority::High, Language::De) => "Hoch",
            (Priority::Medium, Language::De) => "Mittel",
            (Priority::Low, Language::De) => "Niedrig",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effort {
    #[serde(alias = "Leicht")]
    Easy,
    #[serde(alias = "Mittel")]
    Medium,
    #[serde(alias = "Schwer")]
    Hard,
}

impl Effort {
    pub const ALL: [Effort; 3] = [Effort::Easy, Effort::Medium, Effort::Hard];

    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Effort::Easy, Language::En) => "Easy",
            (Effort::Medium, Language::En) => "Medium",
            (Effort::Hard, Language::En) => "Hard",
            (Effort::Easy, Language::De) => "Leicht",
            (Effort::Medium, Language::De) => "Mittel",
            (Effort::Hard, Language::De) => "Schwer",
        }
    }
}

/// Reads an explicit `null` the same way serde's `default` reads an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingFactor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Expected in `[0, 100]`; checked only in strict report mode.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCluster {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

/// `priority` and `effort` may be absent, but a present label must be one of
/// the known variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub effort: Option<Effort>,
}

/// Strategy report built from one completed simulation.
///
/// Absent or null fields deserialize to empty values; the model's answer is
/// otherwise passed through as returned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ranking_factors: Vec<RankingFactor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keyword_clusters: Vec<KeywordCluster>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_plan: Vec<ActionItem>,
}
