use crate::models::{AttendanceHistory, RiskClassification, RiskProfile};

/// Rate above this is high-risk.
const HIGH_RISK_THRESHOLD_PCT: i64 = 30;
/// Rate at or below this, with no recorded cancellations, is trusted.
const TRUSTED_THRESHOLD_PCT: i64 = 10;

/// Classification is a pure function of attendance history; it is never
/// stored and never overridden by hand.
pub fn classify(history: &AttendanceHistory) -> RiskProfile {
    let total = history.total();
    let missed = history.cancelled + history.no_show;
    // Integer percent, truncating: 2 of 3 is 66.
    let rate = if total > 0 { missed * 100 / total } else { 0 };

    let classification = if rate > HIGH_RISK_THRESHOLD_PCT {
        RiskClassification::HighRisk
    } else if rate <= TRUSTED_THRESHOLD_PCT && history.cancelled == 0 {
        RiskClassification::Trusted
    } else {
        RiskClassification::Neutral
    };

    RiskProfile {
        classification,
        cancellation_rate_pct: rate,
        history: *history,
    }
}
