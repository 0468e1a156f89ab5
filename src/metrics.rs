// Runtime metrics module
//
// Lightweight counters for the overlay and health loops

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Runtime counters shared by the overlay controller and the health poller.
///
/// Uses atomic operations so both loops can record without locks. The binary logs a
/// summary on shutdown; tests use the timer gauges to check that superseded timers
/// are really cancelled.
#[derive(Debug)]
pub struct Metrics {
    /// Overlay events processed by the controller
    pub events_handled: AtomicU64,

    /// Auto-hide timers armed over the lifetime of the controller
    pub auto_hide_armed: AtomicU64,

    /// Auto-hide timers currently armed (never more than one)
    pub auto_hide_outstanding: AtomicUsize,

    /// Copy-feedback timers currently armed (never more than one)
    pub copy_feedback_outstanding: AtomicUsize,

    /// Timer expirations ignored because a newer timer superseded them
    pub stale_timer_fires: AtomicU64,

    /// Window show/hide calls that failed
    pub window_errors: AtomicU64,

    /// Clipboard writes that failed
    pub clipboard_errors: AtomicU64,

    /// Health status queries issued (scheduled and manual)
    pub health_polls: AtomicU64,

    /// Health status queries that raised instead of answering
    pub health_poll_failures: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_handled: AtomicU64::new(0),
            auto_hide_armed: AtomicU64::new(0),
            auto_hide_outstanding: AtomicUsize::new(0),
            copy_feedback_outstanding: AtomicUsize::new(0),
            stale_timer_fires: AtomicU64::new(0),
            window_errors: AtomicU64::new(0),
            clipboard_errors: AtomicU64::new(0),
            health_polls: AtomicU64::new(0),
            health_poll_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_event(&self) {
        self.events_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auto_hide_armed(&self) {
        self.auto_hide_armed.fetch_add(1, Ordering::Relaxed);
        self.auto_hide_outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// The armed auto-hide timer fired or was cancelled
    pub fn record_auto_hide_released(&self) {
        self.auto_hide_outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn record_copy_feedback_armed(&self) {
        self.copy_feedback_outstanding.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_copy_feedback_released(&self) {
        self.copy_feedback_outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn record_stale_timer(&self) {
        self.stale_timer_fires.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_error(&self) {
        self.window_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clipboard_error(&self) {
        self.clipboard_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health_poll(&self) {
        self.health_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health_poll_failure(&self) {
        self.health_poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auto_hide_outstanding(&self) -> usize {
        self.auto_hide_outstanding.load(Ordering::SeqCst)
    }

    pub fn copy_feedback_outstanding(&self) -> usize {
        self.copy_feedback_outstanding.load(Ordering::SeqCst)
    }

    pub fn health_polls(&self) -> u64 {
        self.health_polls.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Overlay Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Events: {} handled, {} auto-hide timers armed, {} stale timer fires",
            self.events_handled.load(Ordering::Relaxed),
            self.auto_hide_armed.load(Ordering::Relaxed),
            self.stale_timer_fires.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Timers outstanding: {} auto-hide, {} copy feedback",
            self.auto_hide_outstanding(),
            self.copy_feedback_outstanding()
        );
        tracing::info!(
            "Errors: {} window, {} clipboard",
            self.window_errors.load(Ordering::Relaxed),
            self.clipboard_errors.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Health: {} polls, {} failed",
            self.health_polls.load(Ordering::Relaxed),
            self.health_poll_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
