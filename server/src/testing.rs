// server/src/testing.rs
use crate::registry::{ChannelHandle, ChannelId, PushError};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory channel that records every pushed event.
pub struct RecordingChannel {
    id: ChannelId,
    open: AtomicBool,
    pushed: Mutex<Vec<Value>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: ChannelId) -> Self {
        Self {
            id,
            open: AtomicBool::new(true),
            pushed: Mutex::new(Vec::new()),
        }
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn pushed(&self) -> Vec<Value> {
        self.pushed.lock().unwrap().clone()
    }
}

impl ChannelHandle for RecordingChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn push(&self, event: Value) -> Result<(), PushError> {
        if !self.is_open() {
            return Err(PushError::Closed(self.id));
        }
        self.pushed.lock().unwrap().push(event);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
