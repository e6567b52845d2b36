//! Persistent key-value media the cache stores collections in.
//!
//! A medium maps string keys to string values. Absence of a key is the
//! canonical "no data yet" state.

mod file;
mod memory;

pub use file::{FileMedium, FileMediumConfig};
pub use memory::MemoryMedium;

use crate::error::Result;
use std::sync::Arc;

/// A string-keyed persistent store holding one serialized collection per key.
pub trait Medium: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<M: Medium + ?Sized> Medium for Arc<M> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<M: Medium + ?Sized> Medium for Box<M> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
