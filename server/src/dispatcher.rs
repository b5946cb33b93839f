// server/src/dispatcher.rs
use crate::registry::ConnectionRegistry;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// What happened to a dispatched event. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Handed to the recipient's live channel
    Delivered,
    /// Recipient has no live channel; event dropped
    NotConnected,
    /// Recipient's channel was closed or congested; event dropped
    Dropped,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Best-effort, at-most-once push of events to connected users.
///
/// There is no queue behind this: an event for a user without a live channel is
/// gone. Notifications are UI hints, the document store stays the system of record.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn dispatch(&self, user_id: &str, event: Value) -> Delivery {
        let Some(handle) = self.registry.lookup(user_id) else {
            tracing::debug!("No live channel for user {}, dropping event", user_id);
            return Delivery::NotConnected;
        };

        // Close event was missed; clean up lazily
        if !handle.is_open() {
            tracing::info!(
                "Channel {} for user {} is no longer open, evicting",
                handle.id(),
                user_id
            );
            self.registry.evict(handle.id());
            return Delivery::Dropped;
        }

        match handle.push(event) {
            Ok(()) => {
                tracing::debug!("Pushed event to user {} on channel {}", user_id, handle.id());
                Delivery::Delivered
            }
            Err(e) => {
                tracing::warn!("Failed to push event to user {}: {}", user_id, e);
                Delivery::Dropped
            }
        }
    }
}
