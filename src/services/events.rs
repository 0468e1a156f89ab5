use crate::models::TranslationResult;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Buffer size of the event channel between the backend and the overlay.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events the overlay reacts to.
///
/// On the wire these are tagged JSON objects, e.g.
/// `{"event":"translation-ready","payload":{"original":"hello",...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum OverlayEvent {
    LoadingStarted,
    TranslationReady(TranslationResult),
    /// Raised by the UI when the user presses Escape or the close button.
    Escape,
}

impl OverlayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OverlayEvent::LoadingStarted => "loading-started",
            OverlayEvent::TranslationReady(_) => "translation-ready",
            OverlayEvent::Escape => "escape",
        }
    }
}

/// Failure to attach to the event channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("event channel already has a subscriber")]
    AlreadySubscribed,

    #[error("event channel is closed")]
    Closed,
}

/// Failure to deliver an event to the overlay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("no subscriber is attached to the event channel")]
    NoSubscriber,

    #[error("overlay stopped listening for events")]
    Closed,
}

/// Source of overlay events.
///
/// Subscription is the only step allowed to fail the overlay at start-up.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self) -> Result<mpsc::Receiver<OverlayEvent>, SubscriptionError>;
}

/// In-process event channel with many publishers and a single subscriber.
///
/// Events are delivered in the order each publisher sent them.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<OverlayEvent>,
    rx: Arc<Mutex<Option<mpsc::Receiver<OverlayEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tx,
            rx: Arc::new(Mutex::new(Some(rx))),
        }
    }

    /// Deliver an event, waiting for room if the subscriber lags.
    pub async fn publish(&self, event: OverlayEvent) -> Result<(), PublishError> {
        if self.has_pending_subscription() {
            return Err(PublishError::NoSubscriber);
        }
        tracing::debug!(event = event.name(), "publishing overlay event");
        self.tx.send(event).await.map_err(|_| PublishError::Closed)
    }

    /// True until someone subscribes.
    fn has_pending_subscription(&self) -> bool {
        self.rx
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventSource for EventBus {
    async fn subscribe(&self) -> Result<mpsc::Receiver<OverlayEvent>, SubscriptionError> {
        let mut slot = self.rx.lock().map_err(|_| SubscriptionError::Closed)?;
        slot.take().ok_or(SubscriptionError::AlreadySubscribed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let json = r#"{"event":"translation-ready","payload":{"original":"hello","translated":"こんにちは","source_lang":"en","target_lang":"ja"}}"#;
        let event: OverlayEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            OverlayEvent::TranslationReady(TranslationResult::new(
                "hello",
                "こんにちは",
                "en",
                "ja"
            ))
        );

        let loading: OverlayEvent =
            serde_json::from_str(r#"{"event":"loading-started"}"#).unwrap();
        assert_eq!(loading, OverlayEvent::LoadingStarted);

        let escape: OverlayEvent = serde_json::from_str(r#"{"event":"escape"}"#).unwrap();
        assert_eq!(escape.name(), "escape");
    }

    #[tokio::test]
    async fn test_second_subscription_fails() {
        let bus = EventBus::new();

        assert!(bus.subscribe().await.is_ok());
        assert_eq!(
            bus.subscribe().await.unwrap_err(),
            SubscriptionError::AlreadySubscribed
        );
    }

    #[tokio::test]
    async fn test_publish_before_subscribe_is_rejected() {
        let bus = EventBus::new();

        let result = bus.publish(OverlayEvent::LoadingStarted).await;

        assert_eq!(result, Err(PublishError::NoSubscriber));
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe().await.unwrap();

        bus.publish(OverlayEvent::LoadingStarted).await.unwrap();
        bus.publish(OverlayEvent::Escape).await.unwrap();

        assert_eq!(rx.recv().await, Some(OverlayEvent::LoadingStarted));
        assert_eq!(rx.recv().await, Some(OverlayEvent::Escape));
    }

    #[tokio::test]
    async fn test_publish_after_receiver_dropped() {
        let bus = EventBus::new();
        let rx = bus.subscribe().await.unwrap();
        drop(rx);

        let result = bus.publish(OverlayEvent::LoadingStarted).await;

        assert_eq!(result, Err(PublishError::Closed));
    }
}
