//! Session storage
//!
//! Conversation state lives for the process lifetime only.

mod sessions;

pub use sessions::{Role, Session, SessionInfo, SessionStore, Turn, WaitingFor};
