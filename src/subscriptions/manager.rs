//! Subscription manager for broadcasting cache events.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{CacheEvent, DropReason, SubscriptionConfig, SubscriptionHandle, SubscriptionId};

/// Internal subscription state.
struct Subscription {
    config: SubscriptionConfig,
    sender: Sender<CacheEvent>,
}

impl Subscription {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, event: CacheEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => false,
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Manages subscriptions and broadcasts events.
pub struct SubscriptionManager {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription. Only events after this call are delivered.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        self.subscriptions
            .write()
            .insert(id, Subscription { config, sender });

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Send dropped event (best effort)
            let _ = sub.sender.try_send(CacheEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    // --- Broadcasting ---

    pub fn broadcast_persisted(&self, key: &str, record: Value, dirty: bool) {
        self.broadcast(CacheEvent::Persisted {
            key: key.to_string(),
            record,
            dirty,
        });
    }

    pub fn broadcast_duplicate(&self, key: &str) {
        self.broadcast(CacheEvent::DuplicateRejected {
            key: key.to_string(),
        });
    }

    pub fn broadcast_marked_clean(&self, key: &str, id: Value, count: usize) {
        self.broadcast(CacheEvent::MarkedClean {
            key: key.to_string(),
            id,
            count,
        });
    }

    pub fn broadcast_destroyed(&self, key: &str) {
        self.broadcast(CacheEvent::Destroyed {
            key: key.to_string(),
        });
    }

    /// Internal broadcast helper. Drops subscribers that fail to receive.
    fn broadcast(&self, event: CacheEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            if subs.is_empty() {
                return;
            }
            for (id, sub) in subs.iter() {
                if sub.config.filter.matches(&event) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        // Remove dropped subscriptions
        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    tracing::debug!(subscription = id.0, "dropping slow subscriber");
                    // Try to notify about the drop (might fail, that's ok)
                    let _ = sub.sender.try_send(CacheEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::SubscriptionFilter;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_subscribe_unsubscribe() {
        let manager = SubscriptionManager::new();

        let handle = manager.subscribe(SubscriptionConfig::default());
        assert_eq!(manager.subscription_count(), 1);

        manager.unsubscribe(handle.id);
        assert_eq!(manager.subscription_count(), 0);

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(
            event,
            CacheEvent::Dropped {
                reason: DropReason::Unsubscribed
            }
        );
    }

    #[test]
    fn test_broadcast_to_matching_key() {
        let manager = SubscriptionManager::new();
        let handle = manager.subscribe(SubscriptionConfig {
            filter: SubscriptionFilter::keys(vec!["todos".to_string()]),
            ..Default::default()
        });

        manager.broadcast_persisted("todos", json!({"id": 1}), true);
        manager.broadcast_persisted("users", json!({"id": 2}), true);

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        match event {
            CacheEvent::Persisted { key, record, dirty } => {
                assert_eq!(key, "todos");
                assert_eq!(record, json!({"id": 1}));
                assert!(dirty);
            }
            other => panic!("Expected Persisted event, got {:?}", other),
        }

        // "users" was filtered out
        assert!(handle.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_dirty_filter() {
        let manager = SubscriptionManager::new();
        let handle = manager.subscribe(SubscriptionConfig {
            filter: SubscriptionFilter::dirty(),
            ..Default::default()
        });

        manager.broadcast_persisted("todos", json!({"id": 1}), false);
        manager.broadcast_duplicate("todos");
        manager.broadcast_persisted("todos", json!({"id": 2}), true);
        manager.broadcast_marked_clean("todos", json!(2), 1);

        let events = handle.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], CacheEvent::Persisted { dirty: true, .. }));
        assert!(matches!(&events[1], CacheEvent::MarkedClean { count: 1, .. }));
    }

    #[test]
    fn test_duplicates_are_opt_in() {
        let manager = SubscriptionManager::new();
        let quiet = manager.subscribe(SubscriptionConfig::default());
        let loud = manager.subscribe(SubscriptionConfig {
            filter: SubscriptionFilter::all(),
            ..Default::default()
        });

        manager.broadcast_duplicate("todos");

        assert!(quiet.drain().is_empty());
        assert_eq!(
            loud.drain(),
            vec![CacheEvent::DuplicateRejected {
                key: "todos".to_string()
            }]
        );
    }

    #[test]
    fn test_drop_slow_subscriber() {
        let manager = SubscriptionManager::new();
        let _handle = manager.subscribe(SubscriptionConfig {
            buffer_size: 2,
            filter: SubscriptionFilter::all(),
        });

        for i in 0..10 {
            manager.broadcast_persisted("todos", json!({"id": i}), true);
        }

        assert_eq!(manager.subscription_count(), 0);
    }

    #[test]
    fn test_drop_disconnected_subscriber() {
        let manager = SubscriptionManager::new();
        let handle = manager.subscribe(SubscriptionConfig::default());
        drop(handle);

        manager.broadcast_destroyed("todos");
        assert_eq!(manager.subscription_count(), 0);
    }
}
