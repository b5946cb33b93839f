// common/src/messages.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames a client may send over its notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelRequest {
    /// Binds this channel to `user_id`. Sent once after the channel opens.
    Announce { user_id: String },
}

/// Frames the server pushes to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    Announced { user_id: String },
    Notification { event: Value },
    Error { message: String },
}

/// Body of `POST /api/notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub user_id: String,
    pub event: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub delivered: bool,
}
