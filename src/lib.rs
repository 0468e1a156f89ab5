// Ittai Overlay - translation overlay controller and model daemon health poller
//
// This is the library crate containing the state machines, collaborators and data
// structures. The binary crate (main.rs) wires them to stdin and the console.

pub mod config;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod overlay;
pub mod services;
pub mod state;
pub mod ui;

mod timer;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use health::{HealthPoller, HealthPollerHandle};
pub use metrics::Metrics;
pub use models::{AppState, HealthSnapshot, OverlayConfig, OverlayState, TranslationResult};
pub use overlay::{OverlayController, OverlayHandle};
pub use services::CopyOutcome;
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
