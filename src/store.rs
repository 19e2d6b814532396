//! Append-only record store with `(url, price)` dedup and wholesale snapshots.
//!
//! The store holds the accumulated record set for the life of the process and
//! across restarts via the persisted snapshot. It only ever grows; records are
//! never mutated or deleted. The snapshot is rewritten in full after every
//! page, which is the crash-recovery boundary of the whole system.

use crate::record::ProductRecord;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Shared handle passed from the session down into the walker and extractor.
///
/// The session loop is strictly sequential, so the lock is never contended; it
/// exists so the retried walk closure can reborrow the store per attempt. Any
/// future parallelism needs a redesign, not just this lock.
pub type SharedStore = Mutex<DedupStore>;

/// Locks a shared store, recovering from poisoning since the store has no
/// invalid intermediate states.
pub fn locked(store: &SharedStore) -> MutexGuard<'_, DedupStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Accumulated record set with a `(url, price)` membership index.
#[derive(Debug, Default)]
pub struct DedupStore {
    records: Vec<ProductRecord>,
    seen: HashSet<(String, String)>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a previously snapshotted record list.
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        let seen = records.iter().map(|r| (r.url.clone(), r.price.clone())).collect();
        Self { records, seen }
    }

    /// Loads a store from a snapshot file. A missing file yields an empty store.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No product snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read product snapshot: {}", path.display()))?;
        let records: Vec<ProductRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse product snapshot: {}", path.display()))?;

        debug!("Loaded {} record(s) from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    /// True iff a record with exactly this `(url, price)` pair exists.
    pub fn contains(&self, url: &str, price: &str) -> bool {
        self.seen.contains(&(url.to_string(), price.to_string()))
    }

    /// Appends unconditionally. Callers are the single point of truth for
    /// dedup and must have checked [`contains`](Self::contains) first.
    pub fn add(&mut self, record: ProductRecord) {
        self.seen.insert((record.url.clone(), record.price.clone()));
        self.records.push(record);
    }

    /// Full ordered record list, oldest first.
    pub fn snapshot(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes the full record set, overwriting any previous snapshot.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create snapshot directory: {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.records)
            .context("Failed to serialize product snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write product snapshot: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_record(url: &str, price: &str) -> ProductRecord {
        ProductRecord {
            store: "acme".to_string(),
            kind: "sneakers".to_string(),
            name: "Runner".to_string(),
            price: price.to_string(),
            url: url.to_string(),
            date: 1700000000,
        }
    }

    #[test]
    fn test_empty_store() {
        let store = DedupStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(!store.contains("/p/1", "999"));
    }

    #[test]
    fn test_add_and_contains() {
        let mut store = DedupStore::new();
        store.add(make_record("/p/1", "999"));

        assert!(store.contains("/p/1", "999"));
        assert!(!store.contains("/p/1", "1099"));
        assert!(!store.contains("/p/2", "999"));
    }

    #[test]
    fn test_price_change_is_a_new_record() {
        let mut store = DedupStore::new();
        store.add(make_record("/p/1", "999"));
        store.add(make_record("/p/1", "1099"));

        assert_eq!(store.len(), 2);
        assert!(store.contains("/p/1", "999"));
        assert!(store.contains("/p/1", "1099"));
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut store = DedupStore::new();
        store.add(make_record("/p/1", "100"));
        store.add(make_record("/p/2", "200"));
        store.add(make_record("/p/3", "300"));

        let urls: Vec<&str> = store.snapshot().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["/p/1", "/p/2", "/p/3"]);
    }

    #[test]
    fn test_load_missing_file_starts_empty() {
        let store = DedupStore::load_from(Path::new("/nonexistent/products.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(&path, "not json").unwrap();

        let result = DedupStore::load_from(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.json");

        let mut store = DedupStore::new();
        store.add(make_record("/p/1", "999"));
        store.add(make_record("/p/1", "1099"));
        store.save_to(&path).unwrap();

        let reloaded = DedupStore::load_from(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("/p/1", "999"));
        assert!(reloaded.contains("/p/1", "1099"));
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("products.json");

        let mut store = DedupStore::new();
        store.add(make_record("/p/1", "999"));
        store.save_to(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_dedup_key_completeness_after_reload() {
        // No duplicate key pairs may coexist, reload included
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.json");

        let mut store = DedupStore::new();
        store.add(make_record("/p/1", "999"));
        store.save_to(&path).unwrap();

        let reloaded = DedupStore::load_from(&path).unwrap();
        let keys: HashSet<(String, String)> = reloaded
            .snapshot()
            .iter()
            .map(|r| (r.url.clone(), r.price.clone()))
            .collect();
        assert_eq!(keys.len(), reloaded.len());
    }

    #[test]
    fn test_locked_recovers_from_poison() {
        use std::sync::Arc;

        let store: Arc<SharedStore> = Arc::new(Mutex::new(DedupStore::new()));
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let mut guard = locked(&store);
        guard.add(make_record("/p/1", "999"));
        assert_eq!(guard.len(), 1);
    }
}
