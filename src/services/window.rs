use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Show/hide failure reported by the platform window.
///
/// Visual state is best effort: the overlay logs these and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("failed to show overlay window: {0}")]
    Show(String),

    #[error("failed to hide overlay window: {0}")]
    Hide(String),
}

/// Capability over the native overlay window.
///
/// Both operations are idempotent. Only the overlay controller calls them.
#[async_trait::async_trait]
pub trait WindowHandle: Send + Sync {
    async fn show(&self) -> Result<(), WindowError>;
    async fn hide(&self) -> Result<(), WindowError>;
}

/// Window stand-in used when no native window is attached.
///
/// Tracks the requested visibility and logs every request.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    visible: AtomicBool,
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WindowHandle for HeadlessWindow {
    async fn show(&self) -> Result<(), WindowError> {
        if !self.visible.swap(true, Ordering::SeqCst) {
            tracing::info!("Overlay window shown");
        }
        Ok(())
    }

    async fn hide(&self) -> Result<(), WindowError> {
        if self.visible.swap(false, Ordering::SeqCst) {
            tracing::info!("Overlay window hidden");
        }
        Ok(())
    }
}
