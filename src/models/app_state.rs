use crate::models::health::{HealthPanel, HealthSnapshot};
use crate::models::translation::{MascotState, OverlayState};

/// Single source of truth for everything the presentation layer renders.
///
/// # Ownership
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Two writers share it, each owning a disjoint set of fields:
/// - [`crate::overlay::OverlayController`] owns `overlay`, `copy_feedback`, `notice`
///   and `window_visible`
/// - [`crate::health::HealthPoller`] owns `health`, `health_dismissed` and
///   `command_copied`
///
/// The presentation layer only reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    // Overlay
    pub overlay: OverlayState,
    pub copy_feedback: bool,
    pub notice: Option<String>,
    pub window_visible: bool,

    // Model daemon health; `None` until the first poll completes
    pub health: Option<HealthSnapshot>,
    pub health_dismissed: bool,
    /// The remediation command was just copied
    pub command_copied: bool,
}

impl AppState {
    pub fn mascot(&self) -> MascotState {
        self.overlay.mascot()
    }

    /// Label for the copy button.
    pub fn copy_label(&self) -> &'static str {
        if self.copy_feedback { "Copied!" } else { "Copy" }
    }

    /// Label for the copy button next to the remediation command.
    pub fn command_copy_label(&self) -> &'static str {
        if self.command_copied { "Copied!" } else { "Copy" }
    }

    /// Whether the health panel should be shown at all.
    ///
    /// Suppressed while the status is unknown, after dismissal, and while healthy.
    pub fn health_panel_visible(&self) -> bool {
        match &self.health {
            None => false,
            Some(_) if self.health_dismissed => false,
            Some(snapshot) => !snapshot.is_healthy(),
        }
    }

    /// Remediation panel for the current snapshot, if it should be displayed.
    pub fn health_panel(&self, model: &str) -> Option<HealthPanel> {
        if !self.health_panel_visible() {
            return None;
        }
        self.health
            .as_ref()
            .and_then(|snapshot| HealthPanel::for_snapshot(snapshot, model))
    }

    /// Drop the displayed result and return to idle.
    pub fn clear_overlay(&mut self) {
        self.overlay = OverlayState::Idle;
        self.notice = None;
    }
}
