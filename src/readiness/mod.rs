//! Readiness confirmation
//!
//! Polls a device-reported status flag until it turns true or the poll budget
//! runs out.

pub mod poller;

pub use poller::{PollConfig, ReadinessPoller};
