//! Conversation history
//!
//! Sessions live in memory only and are bounded by count and idle time.

pub mod manager;
pub mod store;

pub use manager::{HistoryStore, SessionGuard};
pub use store::{Role, Session, Turn};
