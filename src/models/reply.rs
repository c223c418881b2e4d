use serde::{Deserialize, Serialize};

/// One turn's outbound payload: text, optional quick-reply menu, and an
/// optional action for the consuming surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuickReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ReplyAction>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            options: Vec::new(),
            action: None,
        }
    }

    pub fn with_options(text: impl Into<String>, options: Vec<QuickReply>) -> Self {
        Reply {
            text: text.into(),
            options,
            action: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickReply {
    pub label: String,
    pub value: String,
}

impl QuickReply {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        QuickReply {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Field names here (`service`, `slot`, `price`, `link`) are a stable
/// contract with external surfaces; internal renames must not leak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyAction {
    AppointmentCreated {
        service: String,
        slot: String,
        price: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    OpenPaymentLink {
        link: String,
    },
}
