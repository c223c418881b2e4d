use serde::{Deserialize, Serialize};

/// Attendance counts for one patient, aggregated from the ledger.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AttendanceHistory {
    pub scheduled: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub no_show: i64,
}

impl AttendanceHistory {
    pub fn total(&self) -> i64 {
        self.scheduled + self.completed + self.cancelled + self.no_show
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RiskClassification {
    Trusted,
    Neutral,
    HighRisk,
}

impl RiskClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClassification::Trusted => "trusted",
            RiskClassification::Neutral => "neutral",
            RiskClassification::HighRisk => "high-risk",
        }
    }
}

/// Derived, never stored; recomputed from history on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub classification: RiskClassification,
    pub cancellation_rate_pct: i64,
    pub history: AttendanceHistory,
}

impl RiskProfile {
    /// Staff-facing affordance for high-risk patients.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self.classification {
            RiskClassification::HighRisk => Some("request_deposit"),
            _ => None,
        }
    }

    pub fn indicator(&self) -> Option<&'static str> {
        match self.classification {
            RiskClassification::HighRisk => Some("risk_alert"),
            RiskClassification::Trusted => Some("reliable"),
            RiskClassification::Neutral => None,
        }
    }
}
