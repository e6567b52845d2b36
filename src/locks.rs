//! Per-key mutual exclusion.
//!
//! Every cache operation is a read-modify-write of a whole collection, so two
//! writers on the same key must not interleave. Different keys never share a
//! lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A lazily populated table of one mutex per collection key.
///
/// Entries are removed once no caller holds or waits on them, so the table
/// only ever holds keys with operations in flight.
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = Arc::clone(
            self.locks
                .lock()
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );

        let result = {
            let _guard = lock.lock();
            f()
        };

        // Clones are only made under the table lock, so a count of two (the
        // table's and ours) means nobody else is holding or waiting.
        let mut locks = self.locks.lock();
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }

        result
    }

    /// Number of keys with operations in flight.
    pub fn active_keys(&self) -> usize {
        self.locks.lock().len()
    }
}
