//! Concurrent access tests.
//!
//! Every operation is a read-modify-write of a whole collection. Without
//! per-key serialization, concurrent persists to one key would lose writes.

use resource_cache::{FileMedium, FileMediumConfig, MemoryMedium, PersistOutcome, ResourceCache};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 50;

fn hammer<M: resource_cache::Medium + 'static>(cache: Arc<ResourceCache<M>>) {
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let outcome = cache
                        .persist("todos", &json!({"id": t * PER_THREAD + i, "thread": t}))
                        .unwrap();
                    assert!(outcome.is_stored());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_persists_lose_nothing() {
    let cache = Arc::new(ResourceCache::new(MemoryMedium::new()));
    hammer(Arc::clone(&cache));

    assert_eq!(cache.len("todos").unwrap(), THREADS * PER_THREAD);
    assert_eq!(cache.dirty_count("todos").unwrap(), THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_persists_on_file_medium() {
    let dir = TempDir::new().unwrap();
    let medium = FileMedium::create(FileMediumConfig {
        path: dir.path().join("cache"),
        cache_size: 2,
        create_if_missing: true,
    })
    .unwrap();
    let cache = Arc::new(ResourceCache::new(medium));
    hammer(Arc::clone(&cache));

    assert_eq!(cache.len("todos").unwrap(), THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_duplicates_stored_once() {
    let cache = Arc::new(ResourceCache::new(MemoryMedium::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache
                    .persist("todos", &json!({"id": 1, "text": "same"}))
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<PersistOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(outcomes.iter().filter(|o| o.is_stored()).count(), 1);
    assert_eq!(cache.len("todos").unwrap(), 1);
}

#[test]
fn test_mark_clean_races_with_persist() {
    let cache = Arc::new(ResourceCache::new(MemoryMedium::new()));
    for i in 0..100 {
        cache.persist("todos", &json!({"id": i})).unwrap();
    }

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 100..200 {
                cache.persist("todos", &json!({"id": i})).unwrap();
            }
        })
    };
    let cleaner = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 0..100 {
                assert_eq!(cache.mark_clean("todos", i).unwrap(), 1);
            }
        })
    };

    writer.join().unwrap();
    cleaner.join().unwrap();

    // No persist was lost and no clean-marking was undone
    assert_eq!(cache.len("todos").unwrap(), 200);
    let dirty: Vec<u64> = cache
        .fetch_all_dirty("todos")
        .unwrap()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(dirty, (100..200).collect::<Vec<u64>>());
}

#[test]
fn test_keys_proceed_independently() {
    let cache = Arc::new(ResourceCache::new(MemoryMedium::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let key = format!("bucket-{}", t);
                for i in 0..PER_THREAD {
                    cache.persist(&key, &json!({"id": i})).unwrap();
                }
                if t % 2 == 0 {
                    cache.destroy_all(&key).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..THREADS {
        let expected = if t % 2 == 0 { 0 } else { PER_THREAD };
        assert_eq!(cache.len(&format!("bucket-{}", t)).unwrap(), expected);
    }
}
