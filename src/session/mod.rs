//! Control-channel session lifecycle

pub mod manager;

pub use manager::{Session, SessionConfig, SessionManager, SessionState};
