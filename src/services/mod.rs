//! Services module - the narrow collaborators the overlay talks to.
//!
//! Each collaborator is an `async_trait` port with its own `thiserror` error type and
//! one concrete implementation:
//!
//! - [`EventSource`] / [`EventBus`]: inbound `loading-started`, `translation-ready` and
//!   `escape` events
//! - [`WindowHandle`] / [`HeadlessWindow`]: show/hide of the overlay window
//! - [`ClipboardSink`] / [`SystemClipboard`]: a single `write_text` call, backed by
//!   `arboard` on the blocking pool
//! - [`HealthCheckService`] / [`OllamaHealthCheck`]: status of the local model daemon
//!
//! None of these know about overlay state; the controllers in
//! [`crate::overlay`] and [`crate::health`] own all decisions.

pub mod clipboard;
pub mod events;
pub mod health_check;
pub mod window;

pub use clipboard::{
    CLIPBOARD_WRITE_TIMEOUT, ClipboardError, ClipboardSink, CopyOutcome, SystemClipboard,
};
pub use events::{EventBus, EventSource, OverlayEvent, PublishError, SubscriptionError};
pub use health_check::{HealthCheckError, HealthCheckService, OllamaHealthCheck};
pub use window::{HeadlessWindow, WindowError, WindowHandle};

#[cfg(test)]
pub use health_check::MockHealthCheckService;
