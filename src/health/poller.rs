use crate::metrics::Metrics;
use crate::models::{HealthPanel, HealthSnapshot};
use crate::overlay::COPY_FEEDBACK_DURATION;
use crate::services::{
    ClipboardError, ClipboardSink, CopyOutcome, HealthCheckError, HealthCheckService,
};
use crate::state::StateManager;
use crate::timer::ArmedTimer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;

/// Fixed cadence of scheduled status queries.
pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

enum Command {
    QueryCompleted {
        trigger: &'static str,
        outcome: Result<HealthSnapshot, HealthCheckError>,
    },
    CopyCommand {
        command: String,
        reply: oneshot::Sender<CopyOutcome>,
    },
    CopyCompleted {
        id: u64,
        result: Result<(), ClipboardError>,
        reply: oneshot::Sender<CopyOutcome>,
    },
    FeedbackElapsed(u64),
}

/// Polls the model daemon and keeps the health snapshot current.
///
/// The first query runs immediately, then every [`HEALTH_POLL_INTERVAL`]. A manual
/// retry adds one query out of band and leaves the cadence alone. Query failures
/// are stored as [`HealthSnapshot::check_failed`] rather than leaving the status
/// unknown.
///
/// At most one query is in flight. Ticks and retries that arrive meanwhile wait for
/// it, and any number of retries collapse into one extra query.
pub struct HealthPoller {
    service: Arc<dyn HealthCheckService>,
    clipboard: Arc<dyn ClipboardSink>,
    state: StateManager,
    metrics: Arc<Metrics>,
    commands_tx: mpsc::UnboundedSender<Command>,

    query: Option<AbortHandle>,
    generation: u64,
    feedback: Option<ArmedTimer>,
    copies: HashMap<u64, AbortHandle>,
}

impl HealthPoller {
    pub fn spawn(
        service: Arc<dyn HealthCheckService>,
        clipboard: Arc<dyn ClipboardSink>,
        state: StateManager,
        metrics: Arc<Metrics>,
    ) -> HealthPollerHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        // One slot: a retry requested while another is pending adds nothing
        let (retry_tx, retry_rx) = mpsc::channel(1);

        let poller = Self {
            service,
            clipboard,
            state: state.clone(),
            metrics,
            commands_tx: commands_tx.clone(),
            query: None,
            generation: 0,
            feedback: None,
            copies: HashMap::new(),
        };
        let task = tokio::spawn(poller.run(retry_rx, commands_rx, shutdown_rx));
        tracing::info!(
            "Health poller started (interval {}ms)",
            HEALTH_POLL_INTERVAL.as_millis()
        );

        HealthPollerHandle {
            retry_tx,
            commands: commands_tx,
            shutdown_tx,
            task: Some(task),
            state,
        }
    }

    async fn run(
        mut self,
        mut retry_rx: mpsc::Receiver<()>,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(HEALTH_POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                Some(command) = commands.recv() => self.handle_command(command),

                _ = interval.tick(), if self.query.is_none() => self.start_query("scheduled"),

                Some(()) = retry_rx.recv(), if self.query.is_none() => {
                    self.start_query("manual retry");
                }
            }
        }

        if let Some(query) = self.query.take() {
            query.abort();
        }
        if let Some(timer) = self.feedback.take() {
            timer.cancel();
        }
        for (_, copy) in self.copies.drain() {
            copy.abort();
        }
        tracing::info!("Health poller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::QueryCompleted { trigger, outcome } => {
                self.query = None;
                self.record(trigger, outcome);
            }
            Command::CopyCommand { command, reply } => self.start_copy(command, reply),
            Command::CopyCompleted { id, result, reply } => {
                self.copies.remove(&id);
                let _ = reply.send(self.on_copy_completed(result));
            }
            Command::FeedbackElapsed(generation) => self.on_feedback_elapsed(generation),
        }
    }

    fn start_query(&mut self, trigger: &'static str) {
        self.metrics.record_health_poll();

        let service = self.service.clone();
        let tx = self.commands_tx.clone();
        let query = tokio::spawn(async move {
            let outcome = service.query_status().await;
            let _ = tx.send(Command::QueryCompleted { trigger, outcome });
        })
        .abort_handle();
        self.query = Some(query);
    }

    fn record(&self, trigger: &'static str, outcome: Result<HealthSnapshot, HealthCheckError>) {
        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Health check failed ({}): {}", trigger, e);
                self.metrics.record_health_poll_failure();
                HealthSnapshot::check_failed()
            }
        };

        tracing::debug!(
            trigger,
            daemon_running = snapshot.daemon_running,
            model_installed = snapshot.model_installed,
            "Health snapshot recorded"
        );
        self.state.record_health(snapshot);
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn start_copy(&mut self, command: String, reply: oneshot::Sender<CopyOutcome>) {
        let id = self.next_generation();
        let clipboard = self.clipboard.clone();
        let tx = self.commands_tx.clone();

        let copy = tokio::spawn(async move {
            let result = clipboard.write_text(&command).await;
            let _ = tx.send(Command::CopyCompleted { id, result, reply });
        })
        .abort_handle();
        self.copies.insert(id, copy);
    }

    fn on_copy_completed(&mut self, result: Result<(), ClipboardError>) -> CopyOutcome {
        if let Some(timer) = self.feedback.take() {
            timer.cancel();
        }

        match result {
            Ok(()) => {
                self.state.set_command_copied(true);
                let generation = self.next_generation();
                self.feedback = Some(ArmedTimer::spawn(
                    &self.commands_tx,
                    generation,
                    COPY_FEEDBACK_DURATION,
                    Command::FeedbackElapsed,
                ));
                CopyOutcome::Copied
            }
            Err(e) => {
                tracing::warn!("Failed to copy remediation command: {}", e);
                self.metrics.record_clipboard_error();
                self.state.set_command_copied(false);
                CopyOutcome::Failed(format!("Copy failed: {}", e))
            }
        }
    }

    fn on_feedback_elapsed(&mut self, generation: u64) {
        match &self.feedback {
            Some(timer) if timer.generation == generation => {
                self.feedback = None;
                self.state.set_command_copied(false);
            }
            _ => {
                self.metrics.record_stale_timer();
                tracing::debug!(generation, "Ignoring stale command-copy timer");
            }
        }
    }
}

/// Handle to a running [`HealthPoller`].
///
/// Dropping the handle stops the poller.
pub struct HealthPollerHandle {
    retry_tx: mpsc::Sender<()>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    state: StateManager,
}

impl HealthPollerHandle {
    /// Query once more right away. Does not move the next scheduled query.
    pub fn retry(&self) {
        match self.retry_tx.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => tracing::debug!("Retry already pending"),
            Err(TrySendError::Closed(())) => {
                tracing::debug!("Retry requested after health poller stopped");
            }
        }
    }

    /// Hide the remediation panel. Polling continues.
    pub fn dismiss(&self) {
        self.state.dismiss_health();
    }

    /// Copy the `ollama run` command from the panel currently shown for `model`.
    pub async fn copy_pull_command(&self, model: &str) -> CopyOutcome {
        let Some(command) = self
            .panel(model)
            .and_then(|panel| panel.pull_command().map(str::to_string))
        else {
            return CopyOutcome::NothingToCopy;
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = Command::CopyCommand {
            command,
            reply: reply_tx,
        };
        if self.commands.send(request).is_err() {
            return CopyOutcome::Failed("health poller stopped".to_string());
        }
        reply_rx
            .await
            .unwrap_or_else(|_| CopyOutcome::Failed("health poller stopped".to_string()))
    }

    /// Latest snapshot, `None` before the first query completes.
    pub fn snapshot(&self) -> Option<HealthSnapshot> {
        self.state.read(|s| s.health.clone())
    }

    pub fn is_dismissed(&self) -> bool {
        self.state.read(|s| s.health_dismissed)
    }

    pub fn is_command_copied(&self) -> bool {
        self.state.read(|s| s.command_copied)
    }

    /// Remediation panel to render, if any.
    pub fn panel(&self, model: &str) -> Option<HealthPanel> {
        self.state.read(|s| s.health_panel(model))
    }

    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Health poller task failed: {}", e);
            }
        }
    }
}

impl Drop for HealthPollerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
