use std::time::Duration;

use crate::models::{AiIntent, Command, DialogState, Resolution, Service};
use crate::services::ai::{classifier, LlmProvider};

const MIN_AI_CONFIDENCE: f32 = 0.5;

const RESET_WORDS: &[&str] = &["menu", "menú", "reset", "start", "inicio", "hola", "hi", "0"];
const CONFIRM_WORDS: &[&str] = &["yes", "y", "si", "sí", "ok", "confirm", "confirmar", "dale"];
const BOOK_WORDS: &[&str] = &[
    "book", "booking", "appointment", "reservar", "reserva", "turno", "agendar", "cita",
];

/// Resolve one inbound message against the current dialog state and the
/// live tenant catalog. Menu digits and exact commands always win; free
/// text goes to the AI classifier under a hard timeout, and any AI
/// failure falls through to the deterministic heuristic. Never blocks
/// past the timeout, never mutates anything.
pub async fn resolve(
    llm: &dyn LlmProvider,
    message: &str,
    state: &DialogState,
    catalog: &[Service],
    timeout: Duration,
) -> Resolution {
    if let Some(resolution) = match_menu(message) {
        return resolution;
    }

    match tokio::time::timeout(timeout, classifier::classify(llm, message, catalog)).await {
        Ok(Ok(c)) => {
            let confident = c.confidence.unwrap_or(0.0) >= MIN_AI_CONFIDENCE;
            if confident {
                return from_classification(c.intent, c.service.as_deref(), catalog);
            }
            tracing::debug!(state = state.as_str(), "low-confidence AI classification, using heuristic");
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "AI classification failed, using heuristic");
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "AI classification timed out, using heuristic");
        }
    }

    heuristic_match(message, catalog)
}

/// Phase 1: exact digits and commands, no AI involved.
fn match_menu(message: &str) -> Option<Resolution> {
    let normalized = message.trim().to_lowercase();
    if normalized.is_empty() {
        return Some(Resolution::Unrecognized);
    }

    // "0" doubles as back-to-menu, so check reset words before digits.
    if RESET_WORDS.contains(&normalized.as_str()) {
        return Some(Resolution::Command(Command::Reset));
    }

    if normalized.chars().all(|c| c.is_ascii_digit()) {
        return normalized.parse().ok().map(Resolution::MenuDigit);
    }

    if CONFIRM_WORDS.contains(&normalized.as_str()) {
        return Some(Resolution::Command(Command::Confirm));
    }

    None
}

fn from_classification(
    intent: AiIntent,
    service_name: Option<&str>,
    catalog: &[Service],
) -> Resolution {
    match intent {
        AiIntent::Service => match service_name.and_then(|name| find_service(name, catalog)) {
            Some(service) => Resolution::Service(service.id.clone()),
            // Recognized something we don't offer: not a match.
            None => Resolution::Unrecognized,
        },
        AiIntent::Book => Resolution::Command(Command::Book),
        AiIntent::Confirm => Resolution::Command(Command::Confirm),
        AiIntent::Reset => Resolution::Command(Command::Reset),
        AiIntent::Unknown => Resolution::Unrecognized,
    }
}

/// Phase 3: deterministic fallback. Case- and accent-folded substring
/// match against the live catalog, then keyword sets.
pub fn heuristic_match(message: &str, catalog: &[Service]) -> Resolution {
    let folded = fold(message);

    for service in catalog {
        let name = fold(&service.name);
        if folded.contains(&name) {
            return Resolution::Service(service.id.clone());
        }
        // Single distinctive word of a multi-word name is enough.
        if name
            .split_whitespace()
            .any(|w| w.len() > 3 && folded.contains(w))
        {
            return Resolution::Service(service.id.clone());
        }
    }

    if BOOK_WORDS.iter().any(|w| folded.contains(w)) {
        return Resolution::Command(Command::Book);
    }
    if CONFIRM_WORDS.iter().any(|w| fold_eq_word(&folded, w)) {
        return Resolution::Command(Command::Confirm);
    }
    if RESET_WORDS.iter().any(|w| fold_eq_word(&folded, w)) {
        return Resolution::Command(Command::Reset);
    }

    Resolution::Unrecognized
}

fn find_service<'a>(name: &str, catalog: &'a [Service]) -> Option<&'a Service> {
    let folded = fold(name);
    catalog
        .iter()
        .find(|s| fold(&s.name) == folded)
        .or_else(|| catalog.iter().find(|s| fold(&s.name).contains(&folded)))
}

/// Lowercase and strip the accents that show up in service names and
/// customer messages.
fn fold(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn fold_eq_word(folded_message: &str, word: &str) -> bool {
    folded_message.split_whitespace().any(|w| w == fold(word))
}
