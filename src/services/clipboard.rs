use std::time::Duration;
use thiserror::Error;

/// Upper bound for one clipboard write, including the platform handshake.
pub const CLIPBOARD_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Clipboard write failure. Recoverable: the overlay stays open so the user can retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard access denied: {0}")]
    AccessDenied(String),

    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write timed out")]
    Timeout,

    #[error("failed to write to clipboard: {0}")]
    Backend(String),
}

impl From<arboard::Error> for ClipboardError {
    fn from(err: arboard::Error) -> Self {
        match err {
            arboard::Error::ClipboardOccupied => Self::AccessDenied(err.to_string()),
            arboard::Error::ClipboardNotSupported => Self::Unavailable(err.to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Outcome of a copy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The text is on the clipboard
    Copied,
    /// There was nothing to copy
    NothingToCopy,
    /// The clipboard refused
    Failed(String),
}

/// Write-only clipboard.
#[async_trait::async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard of the desktop session, through `arboard`.
///
/// `arboard` blocks while it negotiates with the display server, so every write runs
/// on the blocking pool and is bounded by [`CLIPBOARD_WRITE_TIMEOUT`].
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

fn set_text(text: String) -> Result<(), ClipboardError> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}

#[async_trait::async_trait]
impl ClipboardSink for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let owned = text.to_string();
        let write = tokio::task::spawn_blocking(move || set_text(owned));

        match tokio::time::timeout(CLIPBOARD_WRITE_TIMEOUT, write).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => return Err(ClipboardError::Backend(join_error.to_string())),
            Err(_) => return Err(ClipboardError::Timeout),
        }

        tracing::debug!(bytes = text.len(), "Wrote text to clipboard");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupied_clipboard_is_access_denied() {
        let err = ClipboardError::from(arboard::Error::ClipboardOccupied);

        assert!(matches!(err, ClipboardError::AccessDenied(_)));
    }

    #[test]
    fn test_unsupported_clipboard_is_unavailable() {
        let err = ClipboardError::from(arboard::Error::ClipboardNotSupported);

        assert!(matches!(err, ClipboardError::Unavailable(_)));
    }

    #[test]
    fn test_other_errors_keep_description() {
        let err = ClipboardError::from(arboard::Error::Unknown {
            description: "display connection lost".to_string(),
        });

        match err {
            ClipboardError::Backend(message) => {
                assert!(message.contains("display connection lost"));
            }
            other => panic!("expected a backend error, got {:?}", other),
        }
    }
}
