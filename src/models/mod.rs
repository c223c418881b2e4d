pub mod appointment;
pub mod conversation;
pub mod intent;
pub mod reply;
pub mod risk;
pub mod service;
pub mod slot;
pub mod tenant;

pub use appointment::{Appointment, AppointmentOrigin, AppointmentStatus, BookingEvent};
pub use conversation::{CollectedSlots, Conversation, DialogState};
pub use intent::{AiClassification, AiIntent, Command, Resolution};
pub use reply::{QuickReply, Reply, ReplyAction};
pub use risk::{AttendanceHistory, RiskClassification, RiskProfile};
pub use service::Service;
pub use slot::Slot;
pub use tenant::Tenant;
