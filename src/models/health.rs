use serde::{Deserialize, Serialize};

/// Where users are sent to install the model daemon.
pub const DAEMON_INSTALL_URL: &str = "https://ollama.ai";

/// Error message stored when a status query itself fails.
pub const CHECK_FAILED_MESSAGE: &str = "check failed";

/// Last known status of the local model daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub daemon_running: bool,
    pub model_installed: bool,
    pub error_message: Option<String>,
}

impl HealthSnapshot {
    pub fn healthy() -> Self {
        Self {
            daemon_running: true,
            model_installed: true,
            error_message: None,
        }
    }

    /// Snapshot recorded when the status query raised instead of answering.
    pub fn check_failed() -> Self {
        Self {
            daemon_running: false,
            model_installed: false,
            error_message: Some(CHECK_FAILED_MESSAGE.to_string()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.daemon_running && self.model_installed
    }
}

/// One piece of remediation guidance shown in the health panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationStep {
    /// The daemon is not running: install (or start) it.
    InstallDaemon { url: String },
    /// The daemon runs but the configured model is missing.
    PullModel { command: String },
    /// Fallback pointer when the check reported an error.
    HelpLink { url: String },
}

impl RemediationStep {
    pub fn title(&self) -> &'static str {
        match self {
            RemediationStep::InstallDaemon { .. } => "Install Ollama",
            RemediationStep::PullModel { .. } => "Get the Model",
            RemediationStep::HelpLink { .. } => "Not Sure?",
        }
    }
}

/// What the presentation layer renders when the daemon needs attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthPanel {
    pub daemon_running: bool,
    pub model_installed: bool,
    pub error_message: Option<String>,
    pub steps: Vec<RemediationStep>,
}

impl HealthPanel {
    /// The `ollama run` command offered when the model is missing.
    pub fn pull_command(&self) -> Option<&str> {
        self.steps.iter().find_map(|step| match step {
            RemediationStep::PullModel { command } => Some(command.as_str()),
            _ => None,
        })
    }

    /// Build the panel for an unhealthy snapshot.
    ///
    /// Returns `None` for a healthy snapshot; suppression by dismissal or an unknown
    /// status is decided by [`AppState::health_panel`](crate::models::AppState::health_panel).
    pub fn for_snapshot(snapshot: &HealthSnapshot, model: &str) -> Option<Self> {
        if snapshot.is_healthy() {
            return None;
        }

        let mut steps = Vec::new();
        if !snapshot.daemon_running {
            steps.push(RemediationStep::InstallDaemon {
                url: DAEMON_INSTALL_URL.to_string(),
            });
        }
        if !snapshot.model_installed {
            steps.push(RemediationStep::PullModel {
                command: format!("ollama run {}", model),
            });
        }
        if snapshot.error_message.is_some() && !snapshot.daemon_running {
            steps.push(RemediationStep::HelpLink {
                url: DAEMON_INSTALL_URL.to_string(),
            });
        }

        Some(Self {
            daemon_running: snapshot.daemon_running,
            model_installed: snapshot.model_installed,
            error_message: snapshot.error_message.clone(),
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_snapshot_has_no_panel() {
        assert!(HealthPanel::for_snapshot(&HealthSnapshot::healthy(), "qwen2.5:1.5b").is_none());
    }

    #[test]
    fn test_check_failed_panel_lists_every_step() {
        let panel = HealthPanel::for_snapshot(&HealthSnapshot::check_failed(), "qwen2.5:1.5b")
            .expect("unhealthy snapshot should produce a panel");

        assert_eq!(panel.steps.len(), 3);
        assert!(matches!(panel.steps[0], RemediationStep::InstallDaemon { .. }));
        assert_eq!(
            panel.steps[1],
            RemediationStep::PullModel {
                command: "ollama run qwen2.5:1.5b".to_string()
            }
        );
        assert!(matches!(panel.steps[2], RemediationStep::HelpLink { .. }));
    }

    #[test]
    fn test_missing_model_only() {
        let snapshot = HealthSnapshot {
            daemon_running: true,
            model_installed: false,
            error_message: None,
        };

        let panel = HealthPanel::for_snapshot(&snapshot, "llama3").unwrap();
        assert_eq!(panel.steps.len(), 1);
        assert_eq!(panel.steps[0].title(), "Get the Model");
        assert_eq!(panel.pull_command(), Some("ollama run llama3"));
    }

    #[test]
    fn test_daemon_down_with_model_has_no_pull_command() {
        let snapshot = HealthSnapshot {
            daemon_running: false,
            model_installed: true,
            error_message: None,
        };

        let panel = HealthPanel::for_snapshot(&snapshot, "llama3").unwrap();
        assert_eq!(panel.pull_command(), None);
    }
}
