pub mod admin;
pub mod chat;
pub mod events;
pub mod health;
