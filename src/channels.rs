use crate::prelude::*;

use serde::Serialize;

/// One successful whole-device read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub device: String,
    pub time: chrono::DateTime<chrono::Utc>,
    pub values: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    Snapshot(Snapshot),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct Channels {
    pub from_poller: broadcast::Sender<ChannelData>,
    pub to_poller: broadcast::Sender<ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            from_poller: Self::channel(),
            to_poller: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }
}
