//! Typed event bus for application-level listeners.
//!
//! Every externally observable outcome of a sync pass is published here:
//! subscription and permission transitions, replayed notification clicks,
//! and the welcome notification send. Publishing is fire-and-forget; a bus
//! with no subscribers drops events silently.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::platform::NotificationPermission;

/// Broadcast channel capacity; a page-load pass publishes a handful of
/// events, so lagging receivers indicate a stuck listener, not load.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events published by the sync core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SdkEvent {
    /// Push subscription flipped; carries the new enabled state
    SubscriptionChanged(bool),
    /// Native notification permission changed
    PermissionChanged { to: NotificationPermission },
    /// A stored notification click was replayed; carries the click's
    /// opaque data payload verbatim
    NotificationClicked(serde_json::Value),
    /// The one-time welcome notification was sent
    WelcomeNotificationSent {
        title: String,
        message: String,
        url: String,
    },
}

/// Fan-out of [`SdkEvent`]s over a tokio broadcast channel.
///
/// Cloning is cheap and every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SdkEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: SdkEvent) {
        tracing::trace!(?event, "Publishing SDK event");
        // Send only fails when there are no subscribers
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
