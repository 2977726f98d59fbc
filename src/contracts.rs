//! Structured-output contracts handed to the model with every call.
//!
//! Schemas use the Gemini `responseSchema` dialect. Enumerated value sets are
//! generated from the Rust enums in [`crate::types`] so the contract and the
//! deserializers cannot drift apart.

use serde_json::{Value, json};

use crate::language::Language;
use crate::types::{
    Effort, PRICE_SENSITIVITY, Priority, ProviderName, REVIEW_IMPORTANCE, TECHNICAL_DEPTH,
};

/// Sampling temperature for each stage's `generate` call.
pub const SIMULATION_TEMPERATURE: f32 = 0.7;
pub const ANALYSIS_TEMPERATURE: f32 = 0.5;

/// The schema a stage's model response should conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub name: &'static str,
    pub schema: Value,
}

impl Contract {
    /// Top-level fields the schema marks as required.
    pub fn required(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Required top-level fields absent (or null) in `value`.
    pub fn missing_required(&self, value: &Value) -> Vec<&str> {
        self.required()
            .into_iter()
            .filter(|field| value.get(*field).is_none_or(Value::is_null))
            .collect()
    }
}

fn describe(language: Language, en: &str, de: &str) -> String {
    match language {
        Language::En => format!("{} (in English).", en),
        Language::De => format!("{} (auf Deutsch).", de),
    }
}

pub fn simulation_contract(language: Language) -> Contract {
    let provider_names: Vec<&str> = ProviderName::ALL.iter().map(|p| p.label()).collect();
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "providers": {
                "type": "ARRAY",
                "description": describe(
                    language,
                    "One entry per simulated AI search provider",
                    "Ein Eintrag pro simuliertem KI-Suchanbieter",
                ),
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "enum": provider_names },
                        "interceptedQueries": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": describe(
                                language,
                                "Hypothetical internal search queries this provider would issue",
                                "Die hypothetischen internen Suchanfragen dieses Anbieters",
                            ),
                        }
                    },
                    "required": ["name", "interceptedQueries"]
                }
            },
            "detectedIntent": {
                "type": "STRING",
                "description": describe(
                    language,
                    "The detected user intent (e.g. transactional, informational)",
                    "Die erkannte Nutzerabsicht (z.B. Transaktional, Informativ)",
                ),
            },
            "metadata": {
                "type": "OBJECT",
                "properties": {
                    PRICE_SENSITIVITY: {
                        "type": "STRING",
                        "description": describe(
                            language,
                            "Price sensitivity (Low, Medium, High)",
                            "Preissensibilität (Niedrig, Mittel, Hoch)",
                        ),
                    },
                    TECHNICAL_DEPTH: {
                        "type": "STRING",
                        "description": describe(
                            language,
                            "Technical depth (Low, Medium, High)",
                            "Technische Tiefe (Niedrig, Mittel, Hoch)",
                        ),
                    },
                    REVIEW_IMPORTANCE: {
                        "type": "NUMBER",
                        "description": "0-100",
                    }
                },
                "required": [PRICE_SENSITIVITY, TECHNICAL_DEPTH, REVIEW_IMPORTANCE]
            }
        },
        "required": ["providers", "detectedIntent", "metadata"]
    });
    Contract {
        name: "simulation",
        schema,
    }
}

pub fn analysis_contract(language: Language) -> Contract {
    let priorities: Vec<&str> = Priority::ALL.iter().map(|p| p.label(language)).collect();
    let efforts: Vec<&str> = Effort::ALL.iter().map(|e| e.label(language)).collect();
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "executiveSummary": {
                "type": "STRING",
                "description": describe(language, "Summary of the strategy", "Zusammenfassung der Strategie"),
            },
            "rankingFactors": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {
                            "type": "STRING",
                            "description": describe(language, "Name of the ranking factor", "Name des Rankingfaktors"),
                        },
                        "score": { "type": "NUMBER", "description": "0-100" },
                        "description": {
                            "type": "STRING",
                            "description": describe(language, "Explanation", "Erklärung"),
                        }
                    },
                    "required": ["name", "score", "description"]
                }
            },
            "keywordClusters": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "topic": {
                            "type": "STRING",
                            "description": describe(language, "Topic of the cluster", "Thema des Clusters"),
                        },
                        "keywords": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["topic", "keywords"]
                }
            },
            "actionPlan": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {
                            "type": "STRING",
                            "description": describe(language, "Title of the action", "Titel der Massnahme"),
                        },
                        "description": {
                            "type": "STRING",
                            "description": describe(language, "Description of the action", "Beschreibung der Massnahme"),
                        },
                        "priority": { "type": "STRING", "enum": priorities },
                        "effort": { "type": "STRING", "enum": efforts }
                    },
                    "required": ["title", "description", "priority", "effort"]
                }
            }
        },
        "required": ["executiveSummary", "rankingFactors", "keywordClusters", "actionPlan"]
    });
    Contract {
        name: "analysis",
        schema,
    }
}
