//! `sidx.toml` settings flowing into the store and the ingestor

use std::sync::Arc;

use sidx_core::{Context, Record};
use sidx_engine::{IndexedStore, Ingestor, SearchQuery, SidxConfig, CONFIG_FILE_NAME};
use sidx_storage::MemoryEngine;
use tempfile::TempDir;

fn record(n: i64) -> Record {
    Record {
        global_id: n,
        system_object_id: format!("cfg-{}", n),
        id: n,
        id_en: n,
        mode: "cfg".to_string(),
        mode_en: "cfg".to_string(),
        ..Default::default()
    }
}

fn load(toml: &str) -> (SidxConfig, TempDir) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), toml).unwrap();
    let config = SidxConfig::load_or_init(dir.path()).unwrap();
    (config, dir)
}

#[test]
fn test_page_size_from_file_drives_search() {
    let (config, _dir) = load("[retry]\nmax_attempts = 32\n\n[query]\npage_size = 2\n");
    let store = IndexedStore::with_config(MemoryEngine::new(), &config).unwrap();
    let ctx = Context::background();
    for n in 0..10 {
        store.put(&ctx, &record(n)).unwrap();
    }

    assert_eq!(store.page_size(), 2);
    assert_eq!(store.retry_config().max_attempts, 32);

    let query = SearchQuery {
        mode: Some("cfg".into()),
        ..Default::default()
    };
    let page = store.search(&ctx, &query).unwrap();
    assert_eq!(page.size, 10);
    // Window 0..=2
    assert_eq!(page.data.len(), 3);
    assert!(page.has_next);
}

#[test]
fn test_default_file_keeps_default_page_size() {
    let dir = TempDir::new().unwrap();
    let config = SidxConfig::load_or_init(dir.path()).unwrap();
    let store = IndexedStore::with_config(MemoryEngine::new(), &config).unwrap();
    assert_eq!(store.page_size(), 5);
}

#[test]
fn test_workers_from_file_size_the_pool() {
    let (config, _dir) = load("[retry]\nmax_attempts = 16\n\n[ingest]\nworkers = 2\n");
    let store = Arc::new(IndexedStore::with_config(MemoryEngine::new(), &config).unwrap());
    let ingestor = Ingestor::with_config(Arc::clone(&store), &config.ingest).unwrap();

    assert_eq!(ingestor.workers(), 2);

    let report = ingestor.ingest(&Context::background(), (0..16).map(record).collect());
    assert!(report.is_complete(), "{:?}", report.failures);
}

#[test]
fn test_invalid_file_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[ingest]\nworkers = 0\n").unwrap();
    assert!(SidxConfig::load_or_init(dir.path()).is_err());

    let mut config = SidxConfig::default();
    config.ingest.workers = 0;
    assert!(IndexedStore::with_config(MemoryEngine::new(), &config).is_err());
}
