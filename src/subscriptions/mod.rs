//! Subscription system for cache change events.
//!
//! A sync client can subscribe instead of polling `fetch_all_dirty`:
//! - Records persisted (dirty or clean)
//! - Duplicates rejected
//! - Records marked clean
//! - Collections destroyed
//!
//! Subscriptions filter by collection key and use bounded buffers; a
//! subscriber whose buffer fills up is dropped.
//!
//! # Example
//!
//! ```ignore
//! let handle = cache.subscribe(SubscriptionConfig {
//!     filter: SubscriptionFilter::keys(vec!["todos".to_string()]),
//!     ..Default::default()
//! });
//!
//! loop {
//!     match handle.recv() {
//!         Ok(CacheEvent::Persisted { key, record, dirty: true }) => push(&key, &record),
//!         Ok(CacheEvent::Dropped { .. }) | Err(_) => break,
//!         Ok(_) => {}
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    CacheEvent, DropReason, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};
