// Presenter - passive projection of AppState for display
//
// The presenter never drives state. It subscribes to StateChange events, takes a
// fresh snapshot and renders a text frame of what the overlay and the health
// panel show.

use crate::models::{AppState, HealthPanel, MascotState, OverlayState, RemediationStep};
use crate::state::{StateChange, StateManager};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Keyboard shortcut hint shown while idle.
pub fn shortcut_hint() -> &'static str {
    if cfg!(target_os = "macos") { "Cmd+J" } else { "Ctrl+J" }
}

/// Text rendering of one overlay frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub window_visible: bool,
    pub mascot: MascotState,
    pub overlay: Vec<String>,
    /// Remediation panel lines, `None` when suppressed
    pub health: Option<Vec<String>>,
}

impl Frame {
    pub fn render(state: &AppState, model: &str) -> Self {
        Self {
            window_visible: state.window_visible,
            mascot: state.mascot(),
            overlay: render_overlay(state),
            health: state
                .health_panel(model)
                .map(|panel| render_health(&panel, state.command_copy_label())),
        }
    }
}

fn render_overlay(state: &AppState) -> Vec<String> {
    match &state.overlay {
        OverlayState::Idle => vec![format!("Press {} to translate", shortcut_hint())],
        OverlayState::Loading => vec!["Translating...".to_string()],
        OverlayState::Result(result) => {
            let (from, to) = result.direction_labels();
            let mut lines = vec![
                format!("{} -> {}", from, to),
                result.translated.clone(),
                format!("[{}]", state.copy_label()),
            ];
            if let Some(notice) = &state.notice {
                lines.push(notice.clone());
            }
            lines
        }
    }
}

fn render_health(panel: &HealthPanel, copy_label: &str) -> Vec<String> {
    let mut lines = vec!["Ollama Setup Needed".to_string()];

    lines.push(if panel.daemon_running {
        "✓ Ollama is running".to_string()
    } else {
        "✗ Ollama is not running".to_string()
    });
    lines.push(if panel.model_installed {
        "✓ Model is installed".to_string()
    } else {
        "✗ Model not installed".to_string()
    });

    for step in &panel.steps {
        let detail = match step {
            RemediationStep::InstallDaemon { url } => format!("download it from {}", url),
            RemediationStep::PullModel { command } => {
                format!("run `{}` in a terminal [{}]", command, copy_label)
            }
            RemediationStep::HelpLink { url } => format!("see {} for installation help", url),
        };
        lines.push(format!("{}: {}", step.title(), detail));
    }

    lines
}

/// Logs a rendered frame whenever the state changes.
pub struct Presenter;

impl Presenter {
    pub fn spawn(state: StateManager, model: String) -> JoinHandle<()> {
        let mut rx = state.subscribe();

        tokio::spawn(async move {
            tracing::debug!("Presenter subscription started");

            loop {
                match rx.recv().await {
                    Ok(change) => {
                        tracing::trace!("State change received: {:?}", change);
                        if let StateChange::NoticeChanged { notice: Some(notice) } = &change {
                            tracing::warn!("Notice: {}", notice);
                        }
                        let frame = Frame::render(&state.snapshot(), &model);
                        log_frame(&frame);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // The next snapshot covers whatever was missed
                        tracing::warn!("Presenter lagged behind by {} state changes", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            tracing::debug!("Presenter subscription ended");
        })
    }
}

fn log_frame(frame: &Frame) {
    tracing::info!(
        visible = frame.window_visible,
        mascot = frame.mascot.as_str(),
        "overlay: {}",
        frame.overlay.join(" | ")
    );
    if let Some(health) = &frame.health {
        tracing::info!("health: {}", health.join(" | "));
    }
}
