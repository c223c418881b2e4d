use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    Idle,
    MenuRoot,
    ServiceSelection,
    SlotSelection,
    Confirmation,
    Committed,
}

impl DialogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogState::Idle => "idle",
            DialogState::MenuRoot => "menu_root",
            DialogState::ServiceSelection => "service_selection",
            DialogState::SlotSelection => "slot_selection",
            DialogState::Confirmation => "confirmation",
            DialogState::Committed => "committed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "menu_root" => DialogState::MenuRoot,
            "service_selection" => DialogState::ServiceSelection,
            "slot_selection" => DialogState::SlotSelection,
            "confirmation" => DialogState::Confirmation,
            "committed" => DialogState::Committed,
            _ => DialogState::Idle,
        }
    }

    /// States from which a recognized service name may jump straight to
    /// slot selection.
    pub fn allows_service_shortcut(&self) -> bool {
        matches!(
            self,
            DialogState::Idle
                | DialogState::MenuRoot
                | DialogState::ServiceSelection
                | DialogState::SlotSelection
        )
    }
}

/// Selections collected across turns. `offered_slots` holds the slot ids
/// that were actually rendered to the customer, so a digit reply indexes
/// what they saw, not whatever happens to be open now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectedSlots {
    pub service_id: Option<String>,
    pub slot_id: Option<String>,
    pub offered_slots: Vec<String>,
    pub confirmed: bool,
    pub appointment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub tenant_id: String,
    pub session_id: String,
    pub state: DialogState,
    pub collected: CollectedSlots,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
