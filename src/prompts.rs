//! Natural-language instructions sent with each contract.

use crate::language::Language;
use crate::types::{ProviderName, SimulationData};

fn provider_list() -> String {
    ProviderName::ALL
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Instruction for the simulation stage: names the keyword, asks for
/// per-provider internal queries and the fixed metadata signals.
pub fn simulation_prompt(keyword: &str, language: Language) -> String {
    let providers = provider_list();
    match language {
        Language::En => format!(
            "You are a reverse-engineering engine that simulates the internal search process of large language models.\n\
             The user wants information about: \"{keyword}\".\n\n\
             Simulate the \"network traffic\" of the reasoning process of these AI search providers: {providers}.\n\
             For each provider, list the internal sub-queries it would plausibly generate.\n\
             Also rate the metadata it analyses: price sensitivity, technical depth and the importance of reviews (0-100).\n\n\
             {}",
            language.answer_instruction()
        ),
        Language::De => format!(
            "Du bist eine Reverse-Engineering-Engine, die den internen Suchprozess von LLMs simuliert.\n\
             Der Benutzer möchte Informationen zu: \"{keyword}\".\n\n\
             Simuliere den \"Netzwerkverkehr\" des Denkprozesses dieser KI-Suchanbieter: {providers}.\n\
             Welche Unterabfragen (Sub-Queries) würde jeder Anbieter generieren?\n\
             Bewerte ausserdem die analysierten Metadaten: Preissensibilität, technische Tiefe und Wichtigkeit von Bewertungen (0-100).\n\n\
             {}",
            language.answer_instruction()
        ),
    }
}

/// Instruction for the analysis stage, built from a completed simulation.
pub fn analysis_prompt(simulation: &SimulationData, language: Language) -> String {
    let queries = serde_json::to_string(&simulation.flattened_queries()).unwrap_or_default();
    let metadata = serde_json::to_string(&simulation.metadata).unwrap_or_default();
    let keyword = &simulation.target_keyword;
    let intent = &simulation.detected_intent;
    match language {
        Language::En => format!(
            "Analyse the following intercepted LLM search data to build an LLM-SEO strategy.\n\
             Target keyword: {keyword}\n\
             Internal queries: {queries}\n\
             Detected intent: {intent}\n\
             Detected metadata: {metadata}\n\n\
             Your goal is to explain to the user how to rank first in AI answers for this topic.\n\
             1. Identify 5-7 ranking factors and score each from 0 to 100.\n\
             2. Group the discovered keywords into topic clusters.\n\
             3. Produce a prioritized, actionable plan.\n\n\
             {}",
            language.answer_instruction()
        ),
        Language::De => format!(
            "Analysiere die folgenden abgefangenen LLM-Suchdaten, um eine LLM-SEO-Strategie zu erstellen.\n\
             Ziel-Keyword: {keyword}\n\
             Interne Abfragen: {queries}\n\
             Erkannte Absicht: {intent}\n\
             Erkannte Metadaten: {metadata}\n\n\
             Dein Ziel ist es, dem Nutzer zu erklären, wie er für dieses Thema auf Platz 1 der KI-Antworten landet.\n\
             1. Identifiziere 5-7 Ranking-Faktoren und bewerte jeden mit 0 bis 100.\n\
             2. Gruppiere Keywords in Cluster.\n\
             3. Erstelle einen priorisierten, umsetzbaren Massnahmenplan.\n\n\
             {}",
            language.answer_instruction()
        ),
    }
}
