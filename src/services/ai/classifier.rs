use crate::models::{AiClassification, AiIntent, Service};
use crate::services::ai::LlmProvider;

const SYSTEM_PROMPT: &str = r#"You classify one customer message for an appointment booking assistant.

Answer with a single JSON object, nothing else:
{"intent": "book|service|confirm|reset|unknown", "service": <name or null>, "confidence": <0.0-1.0>}

- "service" when the message names or clearly implies one of the services below; copy its name verbatim into "service"
- "book" when the customer wants an appointment but no particular service
- "confirm" when the customer agrees to what was proposed
- "reset" when the customer wants the menu or to start over
- "unknown" otherwise

Never invent a service that is not on the list."#;

pub async fn classify(
    llm: &dyn LlmProvider,
    message: &str,
    catalog: &[Service],
) -> anyhow::Result<AiClassification> {
    let service_list = catalog
        .iter()
        .map(|s| format!("- {}", s.name))
        .collect::<Vec<_>>()
        .join("\n");

    let system = format!("{SYSTEM_PROMPT}\n\nServices offered:\n{service_list}");

    let response = llm.complete(&system, message).await?;

    parse_classification(&response)
}

/// Providers run in JSON mode, but smaller models still fence the object
/// or chatter around it; take the object wherever it is.
fn parse_classification(raw: &str) -> anyhow::Result<AiClassification> {
    let trimmed = raw.trim();

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.strip_suffix("```").unwrap_or(rest).trim())
        .unwrap_or(trimmed);

    for candidate in [trimmed, unfenced] {
        if let Ok(c) = serde_json::from_str::<AiClassification>(candidate) {
            return Ok(c);
        }
    }

    if let (Some(start), Some(end)) = (unfenced.find('{'), unfenced.rfind('}')) {
        if start < end {
            if let Ok(c) = serde_json::from_str::<AiClassification>(&unfenced[start..=end]) {
                return Ok(c);
            }
        }
    }

    tracing::warn!("unparseable classification reply, treating as unknown");
    Ok(AiClassification {
        intent: AiIntent::Unknown,
        service: None,
        confidence: Some(0.0),
    })
}
