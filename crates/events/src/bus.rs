//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] decouples the wizard handlers from outbound notification
//! delivery: handlers publish a [`BotEvent`] after the store write commits,
//! and the notification router decides who hears about it. A failed or slow
//! delivery can therefore never fail the operation that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use kudos_core::PlatformId;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// A member finished a submission; admins review it.
pub const SUBMISSION_RECEIVED: &str = "submission.received";

/// An admin approved a submission; the submitter was credited.
pub const SUBMISSION_APPROVED: &str = "submission.approved";

/// An admin rejected a submission.
pub const SUBMISSION_REJECTED: &str = "submission.rejected";

/// An admin granted points directly to a member.
pub const POINTS_GRANTED: &str = "points.granted";

/// A purchase committed; admins get the receipt.
pub const ORDER_COMPLETED: &str = "order.completed";

/// An admin wiped every store document.
pub const SYSTEM_RESET: &str = "system.reset";

// ---------------------------------------------------------------------------
// BotEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the bot.
///
/// Constructed via [`BotEvent::new`] and enriched with the builder methods
/// [`with_source`](BotEvent::with_source), [`with_actor`](BotEvent::with_actor),
/// and [`with_payload`](BotEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotEvent {
    /// Dot-separated event name, e.g. `"submission.approved"`.
    pub event_type: String,

    /// Optional source entity kind (e.g. `"submission"`, `"product"`).
    pub source_entity_kind: Option<String>,

    /// Optional source entity sequence key.
    pub source_entity_key: Option<String>,

    /// Optional platform id of the member or admin that triggered the event.
    pub actor_id: Option<PlatformId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl BotEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_kind: None,
            source_entity_key: None,
            actor_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a source entity to the event.
    pub fn with_source(mut self, kind: impl Into<String>, key: impl Into<String>) -> Self {
        self.source_entity_kind = Some(kind.into());
        self.source_entity_key = Some(key.into());
        self
    }

    /// Attach the acting member or admin to the event.
    pub fn with_actor(mut self, actor_id: PlatformId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`BotEvent`]. Shared via
/// `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<BotEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the triggering operation has already committed either way.
    pub fn publish(&self, event: BotEvent) {
        // A SendError only means there are zero receivers right now.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BotEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = BotEvent::new(SUBMISSION_APPROVED)
            .with_source("submission", "17")
            .with_actor(7)
            .with_payload(serde_json::json!({"points": 10}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, SUBMISSION_APPROVED);
        assert_eq!(received.source_entity_kind.as_deref(), Some("submission"));
        assert_eq!(received.source_entity_key.as_deref(), Some("17"));
        assert_eq!(received.actor_id, Some(7));
        assert_eq!(received.payload["points"], 10);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(BotEvent::new(ORDER_COMPLETED));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, ORDER_COMPLETED);
        assert_eq!(e2.event_type, ORDER_COMPLETED);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(BotEvent::new(SYSTEM_RESET));
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = BotEvent::new(POINTS_GRANTED);
        assert_eq!(event.event_type, POINTS_GRANTED);
        assert!(event.source_entity_kind.is_none());
        assert!(event.source_entity_key.is_none());
        assert!(event.actor_id.is_none());
        assert!(event.payload.is_object());
    }
}
