//! Data models for the overlay.
//!
//! - [`AppState`]: everything the presentation layer reads, owned by
//!   [`StateManager`](crate::state::StateManager)
//! - [`TranslationResult`] / [`OverlayState`] / [`MascotState`]: the overlay state machine values
//! - [`HealthSnapshot`] / [`HealthPanel`]: model daemon status and its remediation guidance
//! - [`OverlayConfig`]: settings loaded from `overlay.yaml`

pub mod app_state;
pub mod config;
pub mod health;
pub mod translation;

pub use app_state::AppState;
pub use config::{LoggingSettings, OllamaSettings, OverlayConfig};
pub use health::{HealthPanel, HealthSnapshot, RemediationStep};
pub use translation::{MascotState, OverlayState, TranslationResult};
