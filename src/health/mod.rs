//! Model daemon health monitoring.
//!
//! [`HealthPoller`] keeps [`AppState::health`](crate::models::AppState::health) current;
//! the presentation layer derives the remediation panel from it via
//! [`AppState::health_panel`](crate::models::AppState::health_panel).
//!
//! Policies:
//! - the snapshot stays `None` until the first query completes, so nothing flashes
//!   on start-up
//! - a manual retry is an extra sample; the five second cadence is not reset
//! - one query at a time; retries requested while one runs collapse into one more
//! - the `ollama run` command of the panel can be copied, with its own 2 s
//!   acknowledgement
//! - dismissal hides the panel but never stops polling, and is cleared when the
//!   daemon goes from healthy back to unhealthy

pub mod poller;

pub use poller::{HEALTH_POLL_INTERVAL, HealthPoller, HealthPollerHandle};
