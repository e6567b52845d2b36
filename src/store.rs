//! Main cache struct tying the medium, locks and subscriptions together.

use crate::error::{CacheError, Result};
use crate::locks::KeyLocks;
use crate::medium::Medium;
use crate::records::{decode_collection, encode_collection, filter_records, objects_equal};
use crate::resource::Collection;
use crate::subscriptions::{SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager};
use crate::types::{Entry, PersistOutcome, DIRTY_FIELD};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// What to do when the stored string for a key cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorruptionPolicy {
    /// Log a warning and read the collection as empty. The next write to the
    /// key replaces the corrupted value.
    #[default]
    TreatAsEmpty,
    /// Return `CacheError::Corrupted` from every operation on the key.
    Fail,
}

/// Cache configuration.
#[derive(Clone, Debug, Default)]
pub struct CacheConfig {
    /// Handling of undecodable collections.
    pub corruption_policy: CorruptionPolicy,
}

/// A record cache with dirty/clean bookkeeping over a key-value medium.
///
/// Each collection key names an independent JSON array of records. Every
/// operation reads the whole array from the medium, works on it in memory,
/// and writes it back; operations on the same key are serialized, operations
/// on different keys are not.
pub struct ResourceCache<M: Medium> {
    /// Cache configuration.
    config: CacheConfig,

    /// Where collections are stored.
    medium: M,

    /// One lock per key with an operation in flight.
    locks: KeyLocks,

    /// Change event subscribers.
    subscriptions: SubscriptionManager,
}

impl<M: Medium> ResourceCache<M> {
    /// Create a cache over `medium` with the default configuration.
    pub fn new(medium: M) -> Self {
        Self::with_config(medium, CacheConfig::default())
    }

    pub fn with_config(medium: M, config: CacheConfig) -> Self {
        Self {
            config,
            medium,
            locks: KeyLocks::new(),
            subscriptions: SubscriptionManager::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Bind this cache to one key.
    pub fn collection(&self, key: impl Into<String>) -> Collection<'_, M> {
        Collection::new(self, key.into())
    }

    // --- Writes ---

    /// Add a record to the collection under `key`.
    ///
    /// A null record (including `None`) is skipped. A record structurally
    /// equal to an existing one, ignoring `isDirty`, is dropped without
    /// writing anything. Otherwise the record is appended as dirty, unless
    /// it carries `isDirty: false`, in which case it is stored clean.
    pub fn persist<T: Serialize + ?Sized>(&self, key: &str, record: &T) -> Result<PersistOutcome> {
        let value = serde_json::to_value(record)?;
        if value.is_null() {
            return Ok(PersistOutcome::Skipped);
        }

        let Some(mut candidate) = Entry::from_value(value) else {
            return Err(CacheError::InvalidRecord(
                "records must be JSON objects".to_string(),
            ));
        };

        self.locks.with(key, || -> Result<PersistOutcome> {
            let mut entries = self.load(key)?;

            if entries.iter().any(|e| objects_equal(&e.record, &candidate.record)) {
                tracing::debug!(key, "rejected duplicate record");
                self.subscriptions.broadcast_duplicate(key);
                return Ok(PersistOutcome::Duplicate);
            }

            let dirty = candidate.is_dirty != Some(Value::Bool(false));
            candidate.set_dirty(dirty);

            let clean = Value::Object(candidate.record.clone());
            entries.push(candidate);
            self.save(key, &entries)?;

            tracing::debug!(key, dirty, len = entries.len(), "persisted record");
            self.subscriptions.broadcast_persisted(key, clean, dirty);

            Ok(PersistOutcome::Stored { dirty })
        })
    }

    /// Mark every record whose `id` equals `id` as clean.
    ///
    /// The collection is written back even when nothing matched. Returns the
    /// number of records marked.
    pub fn mark_clean(&self, key: &str, id: impl Into<Value>) -> Result<usize> {
        let id = id.into();

        self.locks.with(key, || -> Result<usize> {
            let mut entries = self.load(key)?;

            let mut count = 0;
            for entry in entries.iter_mut().filter(|e| e.has_id(&id)) {
                entry.set_dirty(false);
                count += 1;
            }

            self.save(key, &entries)?;

            tracing::debug!(key, %id, count, "marked clean");
            self.subscriptions.broadcast_marked_clean(key, id, count);

            Ok(count)
        })
    }

    /// Remove the whole collection. Later reads see an empty collection.
    pub fn destroy_all(&self, key: &str) -> Result<()> {
        self.locks.with(key, || -> Result<()> {
            self.medium.remove(key)?;

            tracing::debug!(key, "destroyed collection");
            self.subscriptions.broadcast_destroyed(key);

            Ok(())
        })
    }

    // --- Reads ---

    /// All records including the `isDirty` metadata field.
    pub fn fetch_all_raw(&self, key: &str) -> Result<Vec<Value>> {
        let entries = self.read(key)?;
        Ok(entries.into_iter().map(Entry::into_raw).collect())
    }

    /// All records without metadata, in persistence order.
    pub fn fetch_all(&self, key: &str) -> Result<Vec<Value>> {
        let entries = self.read(key)?;
        Ok(entries.into_iter().map(Entry::into_clean).collect())
    }

    /// Records whose `isDirty` is exactly `true`, without metadata.
    pub fn fetch_all_dirty(&self, key: &str) -> Result<Vec<Value>> {
        let raw = self.fetch_all_raw(key)?;

        let mut predicate = Map::new();
        predicate.insert(DIRTY_FIELD.to_string(), Value::Bool(true));

        Ok(filter_records(&raw, &predicate, true)
            .into_iter()
            .filter_map(Entry::from_value)
            .map(Entry::into_clean)
            .collect())
    }

    /// The first record in persistence order.
    pub fn first(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.read(key)?;
        Ok(entries.into_iter().next().map(Entry::into_clean))
    }

    /// The first record whose `id` equals `id` by value.
    pub fn fetch(&self, key: &str, id: impl Into<Value>) -> Result<Option<Value>> {
        let id = id.into();
        let entries = self.read(key)?;
        Ok(entries
            .into_iter()
            .find(|e| e.has_id(&id))
            .map(Entry::into_clean))
    }

    /// Number of records in the collection.
    pub fn len(&self, key: &str) -> Result<usize> {
        Ok(self.read(key)?.len())
    }

    pub fn is_empty(&self, key: &str) -> Result<bool> {
        Ok(self.len(key)? == 0)
    }

    /// Number of records waiting to be synchronized.
    pub fn dirty_count(&self, key: &str) -> Result<usize> {
        Ok(self.read(key)?.iter().filter(|e| e.is_dirty()).count())
    }

    // --- Typed Reads ---

    pub fn first_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.first(key)?.map(from_record).transpose()
    }

    pub fn fetch_as<T: DeserializeOwned>(&self, key: &str, id: impl Into<Value>) -> Result<Option<T>> {
        self.fetch(key, id)?.map(from_record).transpose()
    }

    pub fn fetch_all_as<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        self.fetch_all(key)?.into_iter().map(from_record).collect()
    }

    pub fn fetch_all_dirty_as<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        self.fetch_all_dirty(key)?
            .into_iter()
            .map(from_record)
            .collect()
    }

    // --- Subscriptions ---

    /// Subscribe to change events. Only changes after this call are seen.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.subscriptions.subscribe(config)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.unsubscribe(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.subscription_count()
    }

    // --- Private Helpers ---

    /// Load under the key lock, so a read never sees a half-finished write.
    fn read(&self, key: &str) -> Result<Vec<Entry>> {
        self.locks.with(key, || self.load(key))
    }

    /// Load and decode a collection. Callers must hold the key lock.
    fn load(&self, key: &str) -> Result<Vec<Entry>> {
        let raw = match self.medium.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(e) if e.is_corruption() => return self.recover(key, e.to_string()),
            Err(e) => return Err(e),
        };

        tracing::trace!(key, bytes = raw.len(), "loaded collection");

        match decode_collection(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => self.recover(key, e.to_string()),
        }
    }

    fn recover(&self, key: &str, reason: String) -> Result<Vec<Entry>> {
        match self.config.corruption_policy {
            CorruptionPolicy::TreatAsEmpty => {
                tracing::warn!(key, %reason, "treating corrupted collection as empty");
                Ok(Vec::new())
            }
            CorruptionPolicy::Fail => Err(CacheError::Corrupted {
                key: key.to_string(),
                reason,
            }),
        }
    }

    fn save(&self, key: &str, entries: &[Entry]) -> Result<()> {
        let encoded = encode_collection(entries)?;
        self.medium.set(key, &encoded)
    }
}

fn from_record<T: DeserializeOwned>(record: Value) -> Result<T> {
    serde_json::from_value(record).map_err(|e| CacheError::Deserialization(e.to_string()))
}
