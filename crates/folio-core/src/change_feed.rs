//! Poll-based change notification.
//!
//! Holds the time of the most recent successful write per content type so
//! page loaders can ask "changed since T?" without a push channel. Each
//! entry is either absent (never written) or "written at T"; `record` is the
//! only transition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Most recent write marker for one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Answer to an update-status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub has_update: bool,
    /// Stored event time, absent when the type was never written
    pub timestamp: Option<i64>,
}

/// Last-write-timestamp table, last call wins.
#[derive(Default)]
pub struct ChangeFeed {
    events: RwLock<HashMap<String, UpdateEvent>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the event for `content_type`. No ordering check is made
    /// against the previous value.
    pub async fn record(&self, content_type: &str, timestamp: i64) {
        let mut events = self.events.write().await;
        events.insert(content_type.to_string(), UpdateEvent { timestamp });
    }

    /// `has_update` iff an event exists and is strictly newer than `since`.
    /// Unknown types simply report no update.
    pub async fn query(&self, content_type: &str, since: i64) -> UpdateStatus {
        let events = self.events.read().await;
        match events.get(content_type) {
            Some(event) => UpdateStatus {
                has_update: event.timestamp > since,
                timestamp: Some(event.timestamp),
            },
            None => UpdateStatus {
                has_update: false,
                timestamp: None,
            },
        }
    }

    /// All current events, sorted by content type.
    pub async fn snapshot(&self) -> Vec<(String, UpdateEvent)> {
        let events = self.events.read().await;
        let mut all: Vec<_> = events.iter().map(|(k, v)| (k.clone(), *v)).collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
