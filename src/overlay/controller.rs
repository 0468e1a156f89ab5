// Overlay controller - owns the idle/loading/result state machine
//
// The controller is an actor: one task consumes a single mailbox that merges
// backend events, handle commands and timer expirations, so transitions never
// interleave. Timers are spawned sleep tasks tagged with a generation id; the
// controller aborts superseded ones and ignores any expiry whose generation is
// no longer the armed one.

use crate::metrics::Metrics;
use crate::models::{AppState, TranslationResult};
use crate::services::{
    ClipboardError, ClipboardSink, CopyOutcome, EventSource, OverlayEvent, SubscriptionError,
    WindowHandle,
};
use crate::state::StateManager;
use crate::timer::ArmedTimer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinHandle};

/// How long a result stays on screen after the most recent `translation-ready`.
pub const AUTO_HIDE_DELAY: Duration = Duration::from_millis(10_000);

/// How long the copy acknowledgement stays on after a successful copy.
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_millis(2_000);

enum Command {
    Close(oneshot::Sender<()>),
    Copy(oneshot::Sender<CopyOutcome>),
    CopyCompleted {
        id: u64,
        displayed: u64,
        result: Result<(), ClipboardError>,
        reply: oneshot::Sender<CopyOutcome>,
    },
    AutoHideElapsed(u64),
    CopyFeedbackElapsed(u64),
}

/// Drives the overlay window from backend events.
///
/// Owns the window handle, the clipboard sink and both timers exclusively. All
/// overlay fields of [`AppState`] are written from here and nowhere else. Clipboard
/// writes run as separate tasks and report back through the mailbox, so a slow
/// clipboard never delays events or timers.
pub struct OverlayController {
    state: StateManager,
    window: Arc<dyn WindowHandle>,
    clipboard: Arc<dyn ClipboardSink>,
    metrics: Arc<Metrics>,

    /// Mailbox sender handed to timer and clipboard tasks
    commands_tx: mpsc::UnboundedSender<Command>,

    generation: u64,
    /// Bumped whenever the displayed content changes; a copy only acknowledges
    /// on the content it was taken from
    displayed: u64,
    auto_hide: Option<ArmedTimer>,
    copy_feedback: Option<ArmedTimer>,
    copies: HashMap<u64, AbortHandle>,
}

impl OverlayController {
    /// Attach to the event source and start the controller loop.
    ///
    /// # Errors
    ///
    /// Fails only if the subscription cannot be established. Nothing is spawned in
    /// that case.
    pub async fn spawn(
        source: &dyn EventSource,
        window: Arc<dyn WindowHandle>,
        clipboard: Arc<dyn ClipboardSink>,
        state: StateManager,
        metrics: Arc<Metrics>,
    ) -> Result<OverlayHandle, SubscriptionError> {
        let events = source.subscribe().await.inspect_err(|e| {
            tracing::error!("Failed to subscribe to overlay events: {}", e);
        })?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let controller = Self::new(state.clone(), window, clipboard, metrics, commands_tx.clone());
        let task = tokio::spawn(controller.run(events, commands_rx, shutdown_rx));
        tracing::info!("Overlay controller started");

        Ok(OverlayHandle {
            commands: commands_tx,
            shutdown_tx,
            task: Some(task),
            state,
        })
    }

    fn new(
        state: StateManager,
        window: Arc<dyn WindowHandle>,
        clipboard: Arc<dyn ClipboardSink>,
        metrics: Arc<Metrics>,
        commands_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            state,
            window,
            clipboard,
            metrics,
            commands_tx,
            generation: 0,
            displayed: 0,
            auto_hide: None,
            copy_feedback: None,
            copies: HashMap::new(),
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<OverlayEvent>,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut events_open = true;

        loop {
            tokio::select! {
                biased;

                // Also fires when the handle is dropped
                _ = shutdown.changed() => break,

                // Events first, so a command sent after a publish sees its effect
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::warn!("Overlay event channel closed, no more events will arrive");
                        events_open = false;
                    }
                },

                Some(command) = commands.recv() => self.handle_command(command).await,
            }
        }

        self.cancel_auto_hide();
        self.cancel_copy_feedback();
        for (_, copy) in self.copies.drain() {
            copy.abort();
        }
        // Dropping `events` here releases the subscription
        tracing::info!("Overlay controller stopped");
    }

    async fn handle_event(&mut self, event: OverlayEvent) {
        tracing::debug!(event = event.name(), "Handling overlay event");
        self.metrics.record_event();

        match event {
            OverlayEvent::LoadingStarted => self.on_loading_started().await,
            OverlayEvent::TranslationReady(result) => self.on_translation_ready(result).await,
            OverlayEvent::Escape => self.close().await,
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Close(ack) => {
                self.close().await;
                let _ = ack.send(());
            }
            Command::Copy(reply) => self.start_copy(reply),
            Command::CopyCompleted {
                id,
                displayed,
                result,
                reply,
            } => {
                let outcome = self.on_copy_completed(id, displayed, result);
                let _ = reply.send(outcome);
            }
            Command::AutoHideElapsed(generation) => self.on_auto_hide_elapsed(generation).await,
            Command::CopyFeedbackElapsed(generation) => self.on_copy_feedback_elapsed(generation),
        }
    }

    // Transitions

    async fn on_loading_started(&mut self) {
        // Cancel before mutating so a stale timer can never hit the new state
        self.cancel_auto_hide();
        self.displayed += 1;
        self.state.show_loading();
        self.show_window().await;
    }

    async fn on_translation_ready(&mut self, result: TranslationResult) {
        self.cancel_auto_hide();
        self.cancel_copy_feedback();
        self.displayed += 1;
        tracing::info!(
            source_lang = %result.source_lang,
            target_lang = %result.target_lang,
            "Showing translation"
        );
        self.state.show_result(result);
        self.show_window().await;
        self.arm_auto_hide();
    }

    /// Return to idle and hide. Re-issues `hide()` even when already idle.
    async fn close(&mut self) {
        self.cancel_auto_hide();
        self.displayed += 1;
        self.state.close_overlay();
        self.hide_window().await;
    }

    fn start_copy(&mut self, reply: oneshot::Sender<CopyOutcome>) {
        let Some(text) = self
            .state
            .read(|s| s.overlay.result().map(|result| result.translated.clone()))
        else {
            tracing::debug!("Copy requested with no result on screen");
            let _ = reply.send(CopyOutcome::NothingToCopy);
            return;
        };

        let id = self.next_generation();
        let displayed = self.displayed;
        let clipboard = self.clipboard.clone();
        let tx = self.commands_tx.clone();

        let copy = tokio::spawn(async move {
            let result = clipboard.write_text(&text).await;
            let _ = tx.send(Command::CopyCompleted {
                id,
                displayed,
                result,
                reply,
            });
        })
        .abort_handle();
        self.copies.insert(id, copy);
    }

    fn on_copy_completed(
        &mut self,
        id: u64,
        displayed: u64,
        result: Result<(), ClipboardError>,
    ) -> CopyOutcome {
        self.copies.remove(&id);
        let current = displayed == self.displayed;

        match result {
            Ok(()) => {
                if current {
                    self.cancel_copy_feedback();
                    self.state.set_copy_feedback(true);
                    self.arm_copy_feedback();
                } else {
                    tracing::debug!("Copy finished after the result was replaced");
                }
                CopyOutcome::Copied
            }
            Err(e) => {
                tracing::warn!("Failed to copy translation: {}", e);
                self.metrics.record_clipboard_error();
                let message = format!("Copy failed: {}", e);
                if current {
                    self.cancel_copy_feedback();
                    self.state.copy_failed(message.clone());
                }
                CopyOutcome::Failed(message)
            }
        }
    }

    async fn on_auto_hide_elapsed(&mut self, generation: u64) {
        match &self.auto_hide {
            Some(timer) if timer.generation == generation => {
                self.auto_hide = None;
                self.metrics.record_auto_hide_released();
                tracing::debug!(generation, "Auto-hide elapsed");
                self.close().await;
            }
            _ => {
                self.metrics.record_stale_timer();
                tracing::debug!(generation, "Ignoring stale auto-hide timer");
            }
        }
    }

    fn on_copy_feedback_elapsed(&mut self, generation: u64) {
        match &self.copy_feedback {
            Some(timer) if timer.generation == generation => {
                self.copy_feedback = None;
                self.metrics.record_copy_feedback_released();
                self.state.set_copy_feedback(false);
            }
            _ => {
                self.metrics.record_stale_timer();
                tracing::debug!(generation, "Ignoring stale copy-feedback timer");
            }
        }
    }

    // Timers

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn arm_auto_hide(&mut self) {
        debug_assert!(self.auto_hide.is_none());
        let generation = self.next_generation();
        let timer = ArmedTimer::spawn(
            &self.commands_tx,
            generation,
            AUTO_HIDE_DELAY,
            Command::AutoHideElapsed,
        );
        tracing::debug!(generation, "Auto-hide armed");
        self.auto_hide = Some(timer);
        self.metrics.record_auto_hide_armed();
    }

    fn cancel_auto_hide(&mut self) {
        if let Some(timer) = self.auto_hide.take() {
            tracing::debug!(generation = timer.generation, "Auto-hide cancelled");
            timer.cancel();
            self.metrics.record_auto_hide_released();
        }
    }

    fn arm_copy_feedback(&mut self) {
        let generation = self.next_generation();
        let timer = ArmedTimer::spawn(
            &self.commands_tx,
            generation,
            COPY_FEEDBACK_DURATION,
            Command::CopyFeedbackElapsed,
        );
        self.copy_feedback = Some(timer);
        self.metrics.record_copy_feedback_armed();
    }

    fn cancel_copy_feedback(&mut self) {
        if let Some(timer) = self.copy_feedback.take() {
            timer.cancel();
            self.metrics.record_copy_feedback_released();
        }
    }

    // Window

    async fn show_window(&self) {
        if let Err(e) = self.window.show().await {
            tracing::warn!("{}", e);
            self.metrics.record_window_error();
        }
    }

    async fn hide_window(&self) {
        if let Err(e) = self.window.hide().await {
            tracing::warn!("{}", e);
            self.metrics.record_window_error();
        }
    }
}

/// Handle to a running [`OverlayController`].
///
/// Dropping the handle stops the controller; [`shutdown`](Self::shutdown) also
/// waits for it.
pub struct OverlayHandle {
    commands: mpsc::UnboundedSender<Command>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    state: StateManager,
}

impl OverlayHandle {
    /// Dismiss the overlay (close button or Escape). Returns once applied.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Close(ack_tx)).is_err() {
            tracing::debug!("Close requested after overlay controller stopped");
            return;
        }
        let _ = ack_rx.await;
    }

    /// Copy the displayed translation to the clipboard.
    pub async fn copy(&self) -> CopyOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(Command::Copy(reply_tx)).is_err() {
            return CopyOutcome::Failed("overlay controller stopped".to_string());
        }
        reply_rx
            .await
            .unwrap_or_else(|_| CopyOutcome::Failed("overlay controller stopped".to_string()))
    }

    pub fn snapshot(&self) -> AppState {
        self.state.snapshot()
    }

    /// Cancel all timers, release the event subscription and wait for the loop to end.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Overlay controller task failed: {}", e);
            }
        }
    }
}

impl Drop for OverlayHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
