use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub tenant_id: String,
    pub patient_id: String,
    pub service_id: String,
    pub service_name: String,
    pub price_cents: i64,
    pub slot_id: String,
    pub slot_day: String,
    pub slot_time: String,
    pub status: AppointmentStatus,
    pub origin: AppointmentOrigin,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentOrigin {
    Bot,
    Manual,
}

impl AppointmentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentOrigin::Bot => "bot",
            AppointmentOrigin::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "manual" => AppointmentOrigin::Manual,
            _ => AppointmentOrigin::Bot,
        }
    }
}

/// Emitted once per successful commit; agenda and dashboard readers
/// subscribe to these over SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub tenant_id: String,
    pub appointment_id: String,
    pub patient_id: String,
    pub service: String,
    pub slot: String,
    pub price: i64,
    pub created_at: String,
}
