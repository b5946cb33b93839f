// server/src/registry.rs
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Identity of one live channel. Two handles are the same channel iff their ids match.
pub type ChannelId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("channel {0} is closed")]
    Closed(ChannelId),
    #[error("channel {0} mailbox is full")]
    Full(ChannelId),
}

/// Transport-agnostic capability to reach one connected client.
pub trait ChannelHandle: Send + Sync {
    fn id(&self) -> ChannelId;

    /// Hand `event` to the transport. Delivery is not acknowledged.
    fn push(&self, event: Value) -> Result<(), PushError>;

    fn is_open(&self) -> bool;
}

/// Live mapping from user id to the channel that user most recently announced on.
///
/// All mutation goes through `announce` and `evict`; every single-key update is
/// atomic under the owning shard's lock, so concurrent channel lifecycle events
/// for different users never interfere.
#[derive(Default)]
pub struct ConnectionRegistry {
    // user id -> current channel
    channels: DashMap<String, Arc<dyn ChannelHandle>>,
    // channel id -> user id it announced, used to resolve `evict`
    owners: DashMap<ChannelId, String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `user_id` to `handle`, last writer wins.
    ///
    /// Returns the handle that was displaced, if it was a different channel. The
    /// displaced channel is left open.
    pub fn announce(
        &self,
        user_id: &str,
        handle: Arc<dyn ChannelHandle>,
    ) -> Option<Arc<dyn ChannelHandle>> {
        let channel_id = handle.id();

        // A channel re-announcing under a new user id gives up its old binding
        if let Some(previous_user) = self.owners.insert(channel_id, user_id.to_string()) {
            if previous_user != user_id {
                self.channels
                    .remove_if(&previous_user, |_, current| current.id() == channel_id);
                tracing::debug!(
                    "Channel {} moved from user {} to {}",
                    channel_id,
                    previous_user,
                    user_id
                );
            }
        }

        let displaced = self.channels.insert(user_id.to_string(), handle);
        tracing::debug!("User {} announced on channel {}", user_id, channel_id);

        displaced.filter(|old| old.id() != channel_id)
    }

    pub fn lookup(&self, user_id: &str) -> Option<Arc<dyn ChannelHandle>> {
        self.channels
            .get(user_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Forget `channel_id`. The user mapping is only removed while it still points at
    /// this channel, so a late close from a replaced connection cannot evict its successor.
    ///
    /// Returns the user id that was unmapped.
    pub fn evict(&self, channel_id: ChannelId) -> Option<String> {
        let (_, user_id) = self.owners.remove(&channel_id)?;

        match self
            .channels
            .remove_if(&user_id, |_, current| current.id() == channel_id)
        {
            Some((user_id, _)) => {
                tracing::debug!("Evicted channel {} for user {}", channel_id, user_id);
                Some(user_id)
            }
            None => {
                tracing::debug!(
                    "Ignoring stale close of channel {} for user {}",
                    channel_id,
                    user_id
                );
                None
            }
        }
    }

    /// Number of users with a live channel
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Drop every mapping. Used at server shutdown; returns how many users were mapped.
    pub fn clear(&self) -> usize {
        let count = self.channels.len();
        self.channels.clear();
        self.owners.clear();
        count
    }
}
