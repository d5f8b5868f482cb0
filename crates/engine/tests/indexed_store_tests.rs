//! End-to-end put/resolve tests against the in-memory engine
//!
//! Covers write visibility through every namespace, not-found handling,
//! pagination boundaries and the conflict-retry contract.

use sidx_core::{Context, Error, KvEngine, Record};
use sidx_engine::{IndexedStore, RetryConfig, SearchQuery};
use sidx_storage::testing::{EngineOp, Fault, FaultyEngine};
use sidx_storage::MemoryEngine;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn scenario_record() -> Record {
    Record {
        global_id: 42,
        system_object_id: "777".to_string(),
        id: 1,
        id_en: 9,
        mode: "abc".to_string(),
        mode_en: "cba".to_string(),
        ..Default::default()
    }
}

fn numbered(n: i64, mode: &str) -> Record {
    Record {
        global_id: n,
        system_object_id: format!("obj-{}", n),
        id: n,
        id_en: n,
        name: format!("Parking {}", n),
        car_capacity: n * 10,
        mode: mode.to_string(),
        mode_en: mode.to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_scenario_put_then_resolve_every_way() {
    init_tracing();
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    let record = scenario_record();

    store.put(&ctx, &record).unwrap();

    let by_pk = store.resolve(&ctx, "777", false, 0, 0).unwrap();
    assert_eq!(by_pk.total, 1);
    assert_eq!(by_pk.records, vec![record.clone()]);

    let by_id = store.resolve(&ctx, "id:1", false, 0, 0).unwrap();
    assert_eq!(by_id.records, vec![record.clone()]);

    let by_mode = store.resolve(&ctx, "mode:abc", true, 5, 0).unwrap();
    assert_eq!(by_mode.total, 1);
    assert_eq!(by_mode.records, vec![record]);
}

#[test]
fn test_global_id_and_alt_indexes_resolve() {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    let record = scenario_record();
    store.put(&ctx, &record).unwrap();

    for key in ["global_id:42", "id_en:9"] {
        assert_eq!(store.resolve(&ctx, key, false, 0, 0).unwrap().records, vec![record.clone()]);
    }
    let alt = store.resolve(&ctx, "mode_en:cba", true, 0, 0).unwrap();
    assert_eq!(alt.total, 1);
}

#[test]
fn test_list_contains_pk_after_put() {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    for n in 0..4 {
        store.put(&ctx, &numbered(n, "abc")).unwrap();
    }
    let record = scenario_record();
    store.put(&ctx, &record).unwrap();

    let count = store.resolve(&ctx, "mode:abc", true, 0, 0).unwrap();
    assert!(count.total >= 1);

    let members = store.engine().lrange("mode:abc", 0, -1).unwrap();
    assert!(members.contains(&"777".to_string()));
}

// ============================================================================
// Not found
// ============================================================================

#[test]
fn test_not_found_is_empty_success() {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();

    let missing = store.resolve(&ctx, "no-such-key", false, 0, 0).unwrap();
    assert!(missing.records.is_empty());
    assert_eq!(missing.total, 0);
}

#[test]
fn test_unique_index_pointing_nowhere_is_empty() {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    store.engine().set("global_id:5", b"gone".to_vec()).unwrap();

    let resolved = store.resolve(&ctx, "global_id:5", false, 0, 0).unwrap();
    assert_eq!(resolved.total, 0);
    assert!(resolved.records.is_empty());
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn test_offset_at_or_past_end_returns_total_only() {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    for n in 0..7 {
        store.put(&ctx, &numbered(n, "night")).unwrap();
    }

    for offset in [7, 8, 100] {
        let page = store.resolve(&ctx, "mode:night", true, 3, offset).unwrap();
        assert_eq!(page.total, 7, "offset {offset}");
        assert!(page.records.is_empty(), "offset {offset}");
    }
}

#[test]
fn test_pages_follow_insertion_order() {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    for n in 0..12 {
        store.put(&ctx, &numbered(n, "day")).unwrap();
    }

    // Inclusive window: page_size 4 at offset 0 covers positions 0..=4
    let first = store.resolve(&ctx, "mode:day", true, 4, 0).unwrap();
    let ids: Vec<i64> = first.records.iter().map(|r| r.global_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    let second = store.resolve(&ctx, "mode:day", true, 4, 5).unwrap();
    let ids: Vec<i64> = second.records.iter().map(|r| r.global_id).collect();
    assert_eq!(ids, vec![5, 6, 7, 8, 9]);
}

#[test]
fn test_search_query_paging_envelope() {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    for n in 0..8 {
        store.put(&ctx, &numbered(n, "24h")).unwrap();
    }

    let query = SearchQuery::from_json(br#"{"mode": "24h", "offset": 2}"#).unwrap();
    let page = store.search_with_page_size(&ctx, &query, 3).unwrap();
    assert_eq!(page.size, 8);
    assert_eq!(page.offset, 2);
    assert_eq!(page.data.len(), 4);
    assert!(page.has_next);
    assert!(page.has_previous);

    let query = SearchQuery::from_json(br#"{"global_id": 3}"#).unwrap();
    let page = store.search_with_page_size(&ctx, &query, 3).unwrap();
    assert_eq!(page.size, 1);
    assert_eq!(page.data[0].name, "Parking 3");
    assert!(!page.has_next);
}

// ============================================================================
// Conflict retry
// ============================================================================

#[test]
fn test_k_conflicts_then_single_write() {
    init_tracing();
    let engine = FaultyEngine::new(MemoryEngine::new());
    engine.fail_times(EngineOp::Exec, Fault::Conflict, 4);
    let store = IndexedStore::new(engine, RetryConfig::default());
    let ctx = Context::background();

    store.put(&ctx, &scenario_record()).unwrap();

    // Exactly one append reached each list despite the retries
    assert_eq!(store.engine().llen("mode:abc").unwrap(), 1);
    assert_eq!(store.engine().llen("mode_en:cba").unwrap(), 1);
    assert_eq!(store.engine().calls(EngineOp::Exec), 5);
}

#[test]
fn test_ceiling_conflicts_leave_nothing_visible() {
    let engine = FaultyEngine::new(MemoryEngine::new());
    engine.fail_times(EngineOp::Exec, Fault::Conflict, 3);
    let store = IndexedStore::new(engine, RetryConfig::new().with_max_attempts(3));
    let ctx = Context::background();

    let err = store.put(&ctx, &scenario_record()).unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));

    for key in ["777", "global_id:42", "id:1", "id_en:9"] {
        assert!(store.resolve(&ctx, key, false, 0, 0).unwrap().records.is_empty());
    }
    assert_eq!(store.resolve(&ctx, "mode:abc", true, 5, 0).unwrap().total, 0);
}

#[test]
fn test_real_conflict_from_concurrent_writer() {
    // A writer sneaking in between watch and exec moves the fence
    struct Interloper {
        inner: MemoryEngine,
        fired: std::sync::atomic::AtomicBool,
    }

    impl KvEngine for Interloper {
        fn get(&self, key: &str) -> sidx_core::Result<Option<Vec<u8>>> {
            if !self.fired.swap(true, std::sync::atomic::Ordering::SeqCst) {
                self.inner.rpush("mode:abc", "intruder")?;
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: Vec<u8>) -> sidx_core::Result<()> {
            self.inner.set(key, value)
        }
        fn rpush(&self, key: &str, member: &str) -> sidx_core::Result<u64> {
            self.inner.rpush(key, member)
        }
        fn lrange(&self, key: &str, start: i64, end: i64) -> sidx_core::Result<Vec<String>> {
            self.inner.lrange(key, start, end)
        }
        fn llen(&self, key: &str) -> sidx_core::Result<u64> {
            self.inner.llen(key)
        }
        fn watch(&self, keys: &[String]) -> sidx_core::Result<sidx_core::Watch> {
            self.inner.watch(keys)
        }
        fn exec(&self, watch: sidx_core::Watch, batch: sidx_core::WriteBatch) -> sidx_core::Result<()> {
            self.inner.exec(watch, batch)
        }
    }

    let engine = Interloper {
        inner: MemoryEngine::new(),
        fired: std::sync::atomic::AtomicBool::new(false),
    };
    let store = IndexedStore::new(engine, RetryConfig::default());
    let ctx = Context::background();

    store.put(&ctx, &scenario_record()).unwrap();

    assert_eq!(store.metrics().snapshot().conflicts, 1);
    assert_eq!(
        store.engine().inner.lrange("mode:abc", 0, -1).unwrap(),
        vec!["intruder", "777"]
    );
}
