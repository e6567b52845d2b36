//! Key-bound views of the cache.
//!
//! A resource type usually owns exactly one collection. Instead of passing
//! its key to every call it can hold a [`Collection`] or implement
//! [`Resource`] and get the cache operations as its own methods.

use crate::error::Result;
use crate::medium::Medium;
use crate::store::ResourceCache;
use crate::types::PersistOutcome;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A cache handle bound to one collection key.
pub struct Collection<'a, M: Medium> {
    cache: &'a ResourceCache<M>,
    key: String,
}

impl<'a, M: Medium> Collection<'a, M> {
    pub(crate) fn new(cache: &'a ResourceCache<M>, key: String) -> Self {
        Self { cache, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cache(&self) -> &'a ResourceCache<M> {
        self.cache
    }

    pub fn persist<T: Serialize + ?Sized>(&self, record: &T) -> Result<PersistOutcome> {
        self.cache.persist(&self.key, record)
    }

    pub fn first(&self) -> Result<Option<Value>> {
        self.cache.first(&self.key)
    }

    pub fn fetch(&self, id: impl Into<Value>) -> Result<Option<Value>> {
        self.cache.fetch(&self.key, id)
    }

    pub fn mark_clean(&self, id: impl Into<Value>) -> Result<usize> {
        self.cache.mark_clean(&self.key, id)
    }

    pub fn fetch_all_raw(&self) -> Result<Vec<Value>> {
        self.cache.fetch_all_raw(&self.key)
    }

    pub fn fetch_all(&self) -> Result<Vec<Value>> {
        self.cache.fetch_all(&self.key)
    }

    pub fn fetch_all_dirty(&self) -> Result<Vec<Value>> {
        self.cache.fetch_all_dirty(&self.key)
    }

    pub fn first_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.cache.first_as(&self.key)
    }

    pub fn fetch_as<T: DeserializeOwned>(&self, id: impl Into<Value>) -> Result<Option<T>> {
        self.cache.fetch_as(&self.key, id)
    }

    pub fn fetch_all_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.cache.fetch_all_as(&self.key)
    }

    pub fn fetch_all_dirty_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.cache.fetch_all_dirty_as(&self.key)
    }

    pub fn len(&self) -> Result<usize> {
        self.cache.len(&self.key)
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.cache.is_empty(&self.key)
    }

    pub fn dirty_count(&self) -> Result<usize> {
        self.cache.dirty_count(&self.key)
    }

    pub fn destroy_all(&self) -> Result<()> {
        self.cache.destroy_all(&self.key)
    }
}

/// A type that owns one collection of the cache.
///
/// Implementors supply the key and the cache; every cache operation is then
/// available as a method with the key filled in.
///
/// ```ignore
/// struct Todos {
///     cache: Arc<ResourceCache<MemoryMedium>>,
/// }
///
/// impl Resource for Todos {
///     type Medium = MemoryMedium;
///     fn key(&self) -> &str { "todos" }
///     fn cache(&self) -> &ResourceCache<MemoryMedium> { &self.cache }
/// }
///
/// todos.persist(&json!({"id": 1, "text": "a"}))?;
/// let pending = todos.fetch_all_dirty()?;
/// ```
pub trait Resource {
    type Medium: Medium;

    /// The collection key this resource stores its records under.
    fn key(&self) -> &str;

    fn cache(&self) -> &ResourceCache<Self::Medium>;

    fn persist<T: Serialize + ?Sized>(&self, record: &T) -> Result<PersistOutcome> {
        self.cache().persist(self.key(), record)
    }

    fn first(&self) -> Result<Option<Value>> {
        self.cache().first(self.key())
    }

    fn fetch(&self, id: impl Into<Value>) -> Result<Option<Value>> {
        self.cache().fetch(self.key(), id)
    }

    fn mark_clean(&self, id: impl Into<Value>) -> Result<usize> {
        self.cache().mark_clean(self.key(), id)
    }

    fn fetch_all_raw(&self) -> Result<Vec<Value>> {
        self.cache().fetch_all_raw(self.key())
    }

    fn fetch_all(&self) -> Result<Vec<Value>> {
        self.cache().fetch_all(self.key())
    }

    fn fetch_all_dirty(&self) -> Result<Vec<Value>> {
        self.cache().fetch_all_dirty(self.key())
    }

    fn first_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.cache().first_as(self.key())
    }

    fn fetch_as<T: DeserializeOwned>(&self, id: impl Into<Value>) -> Result<Option<T>> {
        self.cache().fetch_as(self.key(), id)
    }

    fn fetch_all_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.cache().fetch_all_as(self.key())
    }

    fn fetch_all_dirty_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.cache().fetch_all_dirty_as(self.key())
    }

    fn len(&self) -> Result<usize> {
        self.cache().len(self.key())
    }

    fn is_empty(&self) -> Result<bool> {
        self.cache().is_empty(self.key())
    }

    fn dirty_count(&self) -> Result<usize> {
        self.cache().dirty_count(self.key())
    }

    fn destroy_all(&self) -> Result<()> {
        self.cache().destroy_all(self.key())
    }
}
