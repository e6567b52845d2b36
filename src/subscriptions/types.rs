//! Subscription types for cache change events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: SubscriptionFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: SubscriptionFilter::default(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionFilter {
    /// Collection keys to watch (None = all keys).
    pub keys: Option<Vec<String>>,

    /// Report only persists that stored a dirty record, and no duplicates.
    pub dirty_only: bool,

    /// Include duplicate rejections.
    pub include_duplicates: bool,
}

impl SubscriptionFilter {
    /// Watch every collection.
    pub fn all() -> Self {
        Self {
            include_duplicates: true,
            ..Default::default()
        }
    }

    /// Watch specific collections.
    pub fn keys(keys: Vec<String>) -> Self {
        Self {
            keys: Some(keys),
            ..Default::default()
        }
    }

    /// Watch for new dirty records, the work queue of a sync client.
    pub fn dirty() -> Self {
        Self {
            dirty_only: true,
            ..Default::default()
        }
    }

    pub(crate) fn matches(&self, event: &CacheEvent) -> bool {
        if let (Some(keys), Some(key)) = (&self.keys, event.key()) {
            if !keys.iter().any(|k| k == key) {
                return false;
            }
        }

        match event {
            CacheEvent::Persisted { dirty, .. } => !self.dirty_only || *dirty,
            CacheEvent::DuplicateRejected { .. } => self.include_duplicates && !self.dirty_only,
            CacheEvent::MarkedClean { .. } | CacheEvent::Destroyed { .. } => true,
            CacheEvent::Dropped { .. } => true,
        }
    }
}

/// Events emitted by subscriptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheEvent {
    /// A record was appended to a collection.
    Persisted {
        key: String,
        /// The record without metadata.
        record: Value,
        dirty: bool,
    },

    /// A record was dropped as a structural duplicate.
    DuplicateRejected { key: String },

    /// Records with `id` were marked clean. `count` may be zero.
    MarkedClean { key: String, id: Value, count: usize },

    /// A whole collection was removed.
    Destroyed { key: String },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

impl CacheEvent {
    /// The collection this event concerns, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            CacheEvent::Persisted { key, .. }
            | CacheEvent::DuplicateRejected { key }
            | CacheEvent::MarkedClean { key, .. }
            | CacheEvent::Destroyed { key } => Some(key),
            CacheEvent::Dropped { .. } => None,
        }
    }
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<CacheEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<CacheEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<CacheEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<CacheEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered.
    pub fn drain(&self) -> Vec<CacheEvent> {
        self.receiver.try_iter().collect()
    }
}
