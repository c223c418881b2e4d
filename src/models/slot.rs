use serde::{Deserialize, Serialize};

/// An offerable time slot. `day` is YYYY-MM-DD, `time` is HH:MM.
/// The `available` flag here is a snapshot; the ledger re-checks the row
/// at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub tenant_id: String,
    pub day: String,
    pub time: String,
    pub available: bool,
}

impl Slot {
    pub fn label(&self) -> String {
        format!("{} {}", self.day, self.time)
    }
}
