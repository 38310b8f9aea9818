//! Caches parsed indexes keyed by catalog name, coalescing concurrent
//! decodes of the same catalog into a single read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use catalog_core::Index;
use catalog_store::{CatalogStore, StoreError};
use tokio::sync::Mutex;

#[derive(Clone)]
struct CacheEntry {
    mtime: SystemTime,
    index: Arc<Index>,
}

/// Single-flighted, mtime-invalidated cache of decoded indexes.
///
/// One `tokio::sync::Mutex` serializes both the cache lookup and, on a
/// miss, the decode itself — a concurrent request for the same catalog
/// blocks on the mutex rather than triggering a second decode, which is
/// the coalescing behaviour this loader needs to provide. This trades a little
/// cross-catalog concurrency (two different catalogs can't load in
/// parallel) for a much simpler correctness argument; see DESIGN.md.
pub(crate) struct IndexLoader {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl IndexLoader {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the parsed index for `catalog`, decoding (or re-decoding,
    /// if the on-disk index's mtime has advanced since the cached entry
    /// was built) as needed. Caller must already hold the store's shared
    /// lock.
    pub(crate) async fn load(&self, store: &CatalogStore, catalog: &str) -> Result<Arc<Index>, StoreError> {
        let index_path = store.index_path(catalog);
        let metadata = tokio::fs::metadata(&index_path)
            .await
            .map_err(StoreError::from_io)?;
        let mtime = metadata.modified().map_err(StoreError::from_io)?;

        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(catalog) {
            if entry.mtime == mtime {
                return Ok(entry.index.clone());
            }
        }

        let bytes = tokio::fs::read(&index_path).await.map_err(StoreError::from_io)?;
        let index = Arc::new(catalog_core::codec::decode(&bytes).map_err(StoreError::IndexDecode)?);
        entries.insert(
            catalog.to_string(),
            CacheEntry {
                mtime,
                index: index.clone(),
            },
        );
        Ok(index)
    }

    /// Proactively drops a cached entry after `Store`/`Delete` so the next
    /// reader doesn't pay for a stat-and-compare round trip against a
    /// cache we already know is stale.
    pub(crate) async fn invalidate(&self, catalog: &str) {
        self.entries.lock().await.remove(catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    fn write_sample_catalog(dir: &std::path::Path) {
        std::fs::write(
            dir.join("package.json"),
            r#"{"schema":"olm.package","name":"n"}"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn load_then_reload_after_invalidate() {
        let root = tempdir().unwrap();
        let input = tempdir().unwrap();
        write_sample_catalog(input.path());

        let store = CatalogStore::new(root.path(), "http://localhost/catalogs")
            .await
            .unwrap();
        store
            .store(CancellationToken::new(), "c", input.path())
            .await
            .unwrap();

        let loader = IndexLoader::new();
        let first = loader.load(&store, "c").await.unwrap();
        assert_eq!(first.by_schema.len(), 1);

        loader.invalidate("c").await;
        let second = loader.load(&store, "c").await.unwrap();
        assert_eq!(second.by_schema.len(), 1);
    }

    #[tokio::test]
    async fn missing_catalog_is_not_found() {
        let root = tempdir().unwrap();
        let store = CatalogStore::new(root.path(), "http://localhost/catalogs")
            .await
            .unwrap();
        let loader = IndexLoader::new();
        let err = loader.load(&store, "missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
