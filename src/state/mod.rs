// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for the presentation layer.

use crate::models::{AppState, HealthSnapshot, MascotState, OverlayState, TranslationResult};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// The presentation layer subscribes to these instead of polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The overlay moved to another state or now shows a different result
    OverlayChanged { mascot: MascotState },

    /// The requested window visibility flipped
    WindowVisibilityChanged { visible: bool },

    /// Copy acknowledgement turned on or off
    CopyFeedbackChanged { copied: bool },

    /// Acknowledgement for the copied remediation command turned on or off
    CommandCopiedChanged { copied: bool },

    /// An inline notice appeared or was cleared
    NoticeChanged { notice: Option<String> },

    /// A new health snapshot was stored
    HealthUpdated { healthy: bool },

    /// The remediation panel appeared or disappeared
    HealthPanelVisibilityChanged { visible: bool },
}

/// Thread-safe state manager with event emission
///
/// This is the central state component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// The write lock is only held for the duration of a closure; callers never hold it
/// across an `.await`.
///
/// # Related Types
///
/// - [`crate::overlay::OverlayController`]: writes overlay fields
/// - [`crate::health::HealthPoller`]: writes health fields
/// - [`crate::ui::Presenter`]: primary consumer of state events
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// The broadcast channel buffers 100 events per subscriber.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let copied = state_manager.read(|state| state.copy_feedback);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.read_guard();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let changes = {
            let mut state = self.write_guard();
            let old_state = state.clone();
            update_fn(&mut state);
            Self::detect_changes(&old_state, &state)
        };

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.overlay != new.overlay {
            changes.push(StateChange::OverlayChanged {
                mascot: new.mascot(),
            });
        }

        if old.window_visible != new.window_visible {
            changes.push(StateChange::WindowVisibilityChanged {
                visible: new.window_visible,
            });
        }

        if old.copy_feedback != new.copy_feedback {
            changes.push(StateChange::CopyFeedbackChanged {
                copied: new.copy_feedback,
            });
        }

        if old.command_copied != new.command_copied {
            changes.push(StateChange::CommandCopiedChanged {
                copied: new.command_copied,
            });
        }

        if old.notice != new.notice {
            changes.push(StateChange::NoticeChanged {
                notice: new.notice.clone(),
            });
        }

        if old.health != new.health {
            if let Some(snapshot) = &new.health {
                changes.push(StateChange::HealthUpdated {
                    healthy: snapshot.is_healthy(),
                });
            }
        }

        if old.health_panel_visible() != new.health_panel_visible() {
            changes.push(StateChange::HealthPanelVisibilityChanged {
                visible: new.health_panel_visible(),
            });
        }

        changes
    }

    // Overlay transitions

    /// Enter `Loading`: the previous result is dropped and the window is requested visible
    pub fn show_loading(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.overlay = OverlayState::Loading;
            state.window_visible = true;
        })
    }

    /// Enter `Result` with a fresh payload and reset copy acknowledgement
    pub fn show_result(&self, result: TranslationResult) -> Vec<StateChange> {
        self.update(|state| {
            state.overlay = OverlayState::Result(result);
            state.copy_feedback = false;
            state.notice = None;
            state.window_visible = true;
        })
    }

    /// Return to `Idle` and request the window hidden
    pub fn close_overlay(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.clear_overlay();
            state.window_visible = false;
        })
    }

    pub fn set_copy_feedback(&self, copied: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.copy_feedback = copied;
            if copied {
                state.notice = None;
            }
        })
    }

    /// A copy failed: no acknowledgement, show the notice instead
    pub fn copy_failed(&self, notice: String) -> Vec<StateChange> {
        self.update(|state| {
            state.copy_feedback = false;
            state.notice = Some(notice);
        })
    }

    // Health transitions

    /// Store a new health snapshot, replacing the previous one
    ///
    /// A healthy → unhealthy transition re-arms a previous dismissal so the panel
    /// shows again.
    pub fn record_health(&self, snapshot: HealthSnapshot) -> Vec<StateChange> {
        self.update(|state| {
            let was_healthy = state.health.as_ref().is_some_and(HealthSnapshot::is_healthy);
            if was_healthy && !snapshot.is_healthy() && state.health_dismissed {
                tracing::info!("Model daemon became unhealthy again, re-arming health panel");
                state.health_dismissed = false;
            }
            state.health = Some(snapshot);
        })
    }

    pub fn set_command_copied(&self, copied: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.command_copied = copied;
        })
    }

    /// Suppress the health panel without touching the snapshot
    pub fn dismiss_health(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.health_dismissed = true;
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across tasks
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> TranslationResult {
        TranslationResult::new("hello", "こんにちは", "en", "ja")
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(state.overlay.is_idle());
        assert!(!state.window_visible);
        assert!(state.health.is_none());
    }

    #[test]
    fn test_show_loading_emits_overlay_and_visibility() {
        let manager = StateManager::new();

        let changes = manager.show_loading();

        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            StateChange::OverlayChanged {
                mascot: MascotState::Loading
            }
        );
        assert_eq!(changes[1], StateChange::WindowVisibilityChanged { visible: true });
    }

    #[test]
    fn test_show_result_resets_copy_feedback() {
        let manager = StateManager::new();
        manager.show_result(sample_result());
        manager.set_copy_feedback(true);

        let changes =
            manager.show_result(TranslationResult::new("bye", "さようなら", "en", "ja"));

        assert!(changes.contains(&StateChange::CopyFeedbackChanged { copied: false }));
        assert!(changes.contains(&StateChange::OverlayChanged {
            mascot: MascotState::Success
        }));
        assert!(!manager.read(|s| s.copy_feedback));
    }

    #[test]
    fn test_close_overlay_twice_emits_once() {
        let manager = StateManager::new();
        manager.show_result(sample_result());

        let first = manager.close_overlay();
        let second = manager.close_overlay();

        assert!(!first.is_empty());
        assert!(second.is_empty());
        assert!(manager.read(|s| s.overlay.is_idle()));
    }

    #[test]
    fn test_copy_feedback_clears_notice() {
        let manager = StateManager::new();
        manager.copy_failed("Copy failed".to_string());

        let changes = manager.set_copy_feedback(true);

        assert!(changes.contains(&StateChange::NoticeChanged { notice: None }));
    }

    #[test]
    fn test_first_health_snapshot_shows_panel() {
        let manager = StateManager::new();

        let changes = manager.record_health(HealthSnapshot::check_failed());

        assert_eq!(
            changes,
            vec![
                StateChange::HealthUpdated { healthy: false },
                StateChange::HealthPanelVisibilityChanged { visible: true },
            ]
        );
    }

    #[test]
    fn test_dismissal_persists_while_unhealthy() {
        let manager = StateManager::new();
        manager.record_health(HealthSnapshot::check_failed());
        manager.dismiss_health();

        manager.record_health(HealthSnapshot {
            daemon_running: true,
            model_installed: false,
            error_message: None,
        });

        let state = manager.snapshot();
        assert!(state.health_dismissed);
        assert!(!state.health_panel_visible());
    }

    #[test]
    fn test_dismissal_rearms_after_recovery_and_relapse() {
        let manager = StateManager::new();
        manager.record_health(HealthSnapshot::check_failed());
        manager.dismiss_health();
        manager.record_health(HealthSnapshot::healthy());
        assert!(manager.read(|s| s.health_dismissed));

        let changes = manager.record_health(HealthSnapshot::check_failed());

        assert!(changes.contains(&StateChange::HealthPanelVisibilityChanged { visible: true }));
        assert!(!manager.read(|s| s.health_dismissed));
    }

    #[test]
    fn test_command_copied_emits_its_own_change() {
        let manager = StateManager::new();

        let changes = manager.set_command_copied(true);

        assert_eq!(changes, vec![StateChange::CommandCopiedChanged { copied: true }]);
        assert!(!manager.read(|s| s.copy_feedback));
        assert!(manager.set_command_copied(true).is_empty());
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.show_loading();

        let event = rx.try_recv();
        assert!(matches!(
            event,
            Ok(StateChange::OverlayChanged {
                mascot: MascotState::Loading
            })
        ));
    }

    #[test]
    fn test_clone_shares_state() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.show_result(sample_result());

        assert_eq!(manager2.snapshot().overlay.result(), Some(&sample_result()));
    }
}
