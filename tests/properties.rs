//! Property tests for the cache's bookkeeping invariants.

use proptest::prelude::*;
use resource_cache::{MemoryMedium, PersistOutcome, ResourceCache, DIRTY_FIELD};
use serde_json::{json, Map, Value};

/// Small flat records with an integer id and a few scalar fields.
fn record_strategy() -> impl Strategy<Value = Value> {
    (
        0u32..20,
        prop::collection::btree_map("[a-z]{1,6}", prop_oneof![
            any::<bool>().prop_map(Value::from),
            (-1000i64..1000).prop_map(Value::from),
            "[a-zA-Z ]{0,10}".prop_map(Value::from),
        ], 0..4),
    )
        .prop_map(|(id, fields)| {
            let mut record: Map<String, Value> = fields
                .into_iter()
                .filter(|(name, _)| name != "id")
                .collect();
            record.insert("id".to_string(), json!(id));
            Value::Object(record)
        })
}

proptest! {
    #[test]
    fn prop_round_trip(record in record_strategy()) {
        let cache = ResourceCache::new(MemoryMedium::new());
        cache.persist("k", &record).unwrap();

        let fetched = cache.fetch("k", record["id"].clone()).unwrap();
        prop_assert_eq!(fetched, Some(record));
    }

    #[test]
    fn prop_persist_twice_stores_once(record in record_strategy()) {
        let cache = ResourceCache::new(MemoryMedium::new());

        prop_assert_eq!(cache.persist("k", &record).unwrap(), PersistOutcome::Stored { dirty: true });
        prop_assert_eq!(cache.persist("k", &record).unwrap(), PersistOutcome::Duplicate);
        prop_assert_eq!(cache.len("k").unwrap(), 1);
    }

    #[test]
    fn prop_no_structural_duplicates(records in prop::collection::vec(record_strategy(), 0..30)) {
        let cache = ResourceCache::new(MemoryMedium::new());
        for record in &records {
            cache.persist("k", record).unwrap();
        }

        let stored = cache.fetch_all("k").unwrap();
        for (i, a) in stored.iter().enumerate() {
            for b in &stored[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
        // Persistence order is kept: stored records appear in input order
        let mut expected: Vec<Value> = Vec::new();
        for record in records {
            if !expected.contains(&record) {
                expected.push(record);
            }
        }
        prop_assert_eq!(stored, expected);
    }

    #[test]
    fn prop_metadata_visibility(records in prop::collection::vec(record_strategy(), 1..20)) {
        let cache = ResourceCache::new(MemoryMedium::new());
        for record in &records {
            cache.persist("k", record).unwrap();
        }

        for record in cache.fetch_all("k").unwrap() {
            prop_assert!(record.get(DIRTY_FIELD).is_none());
        }
        for record in cache.fetch_all_raw("k").unwrap() {
            prop_assert!(record.get(DIRTY_FIELD).is_some());
        }
    }

    #[test]
    fn prop_mark_clean_removes_id_from_dirty_set(
        records in prop::collection::vec(record_strategy(), 1..20),
        target in 0u32..20,
    ) {
        let cache = ResourceCache::new(MemoryMedium::new());
        for record in &records {
            cache.persist("k", record).unwrap();
        }
        let before = cache.len("k").unwrap();

        cache.mark_clean("k", target).unwrap();

        let dirty = cache.fetch_all_dirty("k").unwrap();
        prop_assert!(dirty.iter().all(|r| r["id"] != json!(target)));
        prop_assert_eq!(cache.len("k").unwrap(), before);
    }
}
