// Generation-tagged one-shot timers for the actor loops
//
// A timer is a spawned sleep task that posts a message into its owner's mailbox.
// The owner keeps the abort handle and compares generations on arrival, so an
// expiry that raced a cancellation is recognised as stale.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

pub(crate) struct ArmedTimer {
    pub(crate) generation: u64,
    handle: AbortHandle,
}

impl ArmedTimer {
    /// Post `on_elapsed(generation)` to `tx` after `delay`.
    pub(crate) fn spawn<C>(
        tx: &mpsc::UnboundedSender<C>,
        generation: u64,
        delay: Duration,
        on_elapsed: fn(u64) -> C,
    ) -> Self
    where
        C: Send + 'static,
    {
        let tx = tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(on_elapsed(generation));
        })
        .abort_handle();

        Self { generation, handle }
    }

    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_posts_its_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _timer = ArmedTimer::spawn(&tx, 7, Duration::from_millis(500), |generation| generation);

        assert_eq!(rx.recv().await, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_posts() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u64>();

        let timer = ArmedTimer::spawn(&tx, 1, Duration::from_millis(500), |generation| generation);
        timer.cancel();
        drop(tx);

        assert_eq!(rx.recv().await, None);
    }
}
