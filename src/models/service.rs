use serde::{Deserialize, Serialize};

/// A bookable service in a tenant's catalog. `position` is the insertion
/// order and drives the menu numbering shown to customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_min: i32,
    pub position: i32,
}

impl Service {
    pub fn price_display(&self) -> String {
        format!("${}", self.price_cents / 100)
    }
}
