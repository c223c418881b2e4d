use serde::{Deserialize, Serialize};

/// Outcome of intent resolution for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An all-digit reply; the state machine interprets it against the
    /// menu it last rendered.
    MenuDigit(usize),
    /// A service from the live tenant catalog, by id.
    Service(String),
    Command(Command),
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Book,
    Confirm,
    Reset,
}

/// Raw AI classification payload, parsed from the provider's JSON reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiClassification {
    pub intent: AiIntent,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiIntent {
    Book,
    Service,
    Confirm,
    Reset,
    Unknown,
}
