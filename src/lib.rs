//! # Resource Cache
//!
//! A client-side record cache with deferred-synchronization bookkeeping.
//! Records are kept in named collections on a key-value medium and tagged
//! dirty until a sync client reports that the remote side acknowledged them.
//!
//! ## Core Concepts
//!
//! - **Collections**: JSON arrays of records stored under a string key
//! - **Dirty records**: persisted locally but not yet acknowledged remotely
//! - **Media**: where collections live (memory, a directory of files, or
//!   anything implementing [`Medium`])
//! - **Subscriptions**: change events for sync clients
//!
//! ## Example
//!
//! ```ignore
//! use resource_cache::{MemoryMedium, ResourceCache};
//!
//! let cache = ResourceCache::new(MemoryMedium::new());
//!
//! cache.persist("todos", &json!({"id": 1, "text": "a"}))?;
//! cache.persist("todos", &json!({"id": 2, "text": "b", "isDirty": false}))?;
//!
//! // Push the dirty subset, then acknowledge
//! for record in cache.fetch_all_dirty("todos")? {
//!     remote.push(&record)?;
//!     cache.mark_clean("todos", record["id"].clone())?;
//! }
//! ```

pub mod error;
pub mod locks;
pub mod medium;
pub mod records;
pub mod resource;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{CacheError, Result};
pub use medium::{FileMedium, FileMediumConfig, Medium, MemoryMedium};
pub use records::{filter_records, matches_predicate, objects_equal, values_equal};
pub use resource::{Collection, Resource};
pub use store::{CacheConfig, CorruptionPolicy, ResourceCache};
pub use subscriptions::{
    CacheEvent, DropReason, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId, SubscriptionManager,
};
pub use types::*;
