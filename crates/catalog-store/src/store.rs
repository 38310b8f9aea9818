//! Orchestrates ingestion, owns the per-root reader-writer lock, and
//! exposes the store's lifecycle operations.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use catalog_core::{BlobWalker, Indexer, Meta};
use tokio::fs;
use tokio::io::AsyncWriteExt as _;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::paths::{blob_path, index_path, temp_path, validate_catalog_name};

/// Meta records are relayed from the walker task to the indexer task
/// through a bounded channel; its capacity is the forward-progress knob —
/// small enough to bound memory, large enough that a brief indexer stall
/// doesn't stall the walker on every single blob.
const CHANNEL_CAPACITY: usize = 64;

/// Owns all filesystem state for a set of catalogs under one root
/// directory, gated by a single reader-writer lock.
pub struct CatalogStore {
    root: PathBuf,
    base_url: String,
    lock: RwLock<()>,
}

impl CatalogStore {
    /// Validates and prepares `root` for use (creating it with
    /// owner-only permissions if absent) before any catalog is served.
    pub async fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self, StoreError> {
        let root = root.into();
        ensure_root_dir(&root).await?;
        Ok(Self {
            root,
            base_url: base_url.into(),
            lock: RwLock::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic URL for a catalog's API surface; depends only on the
    /// configured base URL and the catalog name.
    pub fn base_url(&self, catalog: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), catalog)
    }

    pub fn blob_path(&self, catalog: &str) -> PathBuf {
        blob_path(&self.root, catalog)
    }

    pub fn index_path(&self, catalog: &str) -> PathBuf {
        index_path(&self.root, catalog)
    }

    /// True iff both the blob file and the index file exist as regular
    /// files, evaluated under a shared lock so it can't observe a
    /// half-written `Store`.
    pub async fn content_exists(&self, catalog: &str) -> bool {
        if validate_catalog_name(catalog).is_err() {
            return false;
        }
        let _guard = self.lock.read().await;
        is_regular_file(&self.blob_path(catalog)).await && is_regular_file(&self.index_path(catalog)).await
    }

    /// Replaces `catalog`'s content wholesale from `input_root`. Holds the
    /// store's exclusive lock for the full duration; on any failure the
    /// live files (if any) are left untouched and temp files are removed.
    pub async fn store(
        &self,
        ctx: CancellationToken,
        catalog: &str,
        input_root: &Path,
    ) -> Result<(), StoreError> {
        validate_catalog_name(catalog)?;
        let _guard = self.lock.write().await;

        let tmp_blob = temp_path(&self.root, catalog, "blob");
        let tmp_index = temp_path(&self.root, catalog, "index");

        let ingest_result = ingest(ctx, input_root, &tmp_blob, &tmp_index).await;

        if let Err(err) = &ingest_result {
            warn!(catalog, error = %err, "ingestion failed, cleaning up temp files");
            let _ = fs::remove_file(&tmp_blob).await;
            let _ = fs::remove_file(&tmp_index).await;
            return ingest_result;
        }

        let blob_dst = self.blob_path(catalog);
        let index_dst = self.index_path(catalog);
        let commit_result = commit(&tmp_blob, &tmp_index, &blob_dst, &index_dst).await;

        if commit_result.is_err() {
            let _ = fs::remove_file(&tmp_blob).await;
            let _ = fs::remove_file(&tmp_index).await;
        } else {
            info!(catalog, "catalog installed");
        }
        commit_result
    }

    /// Removes both of `catalog`'s files; absence is not an error.
    pub async fn delete(&self, catalog: &str) -> Result<(), StoreError> {
        validate_catalog_name(catalog)?;
        let _guard = self.lock.write().await;
        remove_if_exists(&self.blob_path(catalog)).await?;
        remove_if_exists(&self.index_path(catalog)).await?;
        info!(catalog, "catalog deleted");
        Ok(())
    }

    /// Shared-lock guard for readers (HTTP handlers, index loading) that
    /// need to hold the lock across a whole response lifetime.
    pub async fn read_guard(&self) -> tokio::sync::RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }
}

async fn ensure_root_dir(root: &Path) -> Result<(), StoreError> {
    if !root.exists() {
        fs::create_dir_all(root).await.map_err(StoreError::from_io)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            fs::set_permissions(root, perms).await.map_err(StoreError::from_io)?;
        }
    }
    Ok(())
}

/// Installs `tmp_blob`/`tmp_index` as `blob_dst`/`index_dst` as a single
/// recoverable unit: any prior pair at the destination is moved aside
/// first, the two renames are attempted, and on any failure the
/// destinations are restored to the prior pair (or removed, if there was
/// none) before the error is returned — so a reader can never observe a
/// mix of the old and new catalog, whether the commit succeeds or fails.
async fn commit(tmp_blob: &Path, tmp_index: &Path, blob_dst: &Path, index_dst: &Path) -> Result<(), StoreError> {
    let backup_blob = backup_of(blob_dst);
    let backup_index = backup_of(index_dst);

    let had_prior_blob = fs::metadata(blob_dst).await.is_ok();
    let had_prior_index = fs::metadata(index_dst).await.is_ok();

    if had_prior_blob {
        fs::rename(blob_dst, &backup_blob).await.map_err(StoreError::from_io)?;
    }
    if had_prior_index {
        fs::rename(index_dst, &backup_index).await.map_err(StoreError::from_io)?;
    }

    let blob_result = fs::rename(tmp_blob, blob_dst).await;
    let index_result = fs::rename(tmp_index, index_dst).await;

    if blob_result.is_ok() && index_result.is_ok() {
        if had_prior_blob {
            let _ = fs::remove_file(&backup_blob).await;
        }
        if had_prior_index {
            let _ = fs::remove_file(&backup_index).await;
        }
        return Ok(());
    }

    // At least one rename failed: undo whichever half succeeded and
    // restore the prior pair so the destinations end up exactly as they
    // were before this commit started.
    if blob_result.is_ok() {
        let _ = fs::remove_file(blob_dst).await;
    }
    if index_result.is_ok() {
        let _ = fs::remove_file(index_dst).await;
    }
    if had_prior_blob {
        let _ = fs::rename(&backup_blob, blob_dst).await;
    }
    if had_prior_index {
        let _ = fs::rename(&backup_index, index_dst).await;
    }

    Err(StoreError::join(
        blob_result.map(|_| ()).map_err(StoreError::from_io),
        index_result.map(|_| ()).map_err(StoreError::from_io),
    )
    .unwrap_err())
}

fn backup_of(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

async fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::from_io(e)),
    }
}

/// Runs the two cooperating ingestion tasks and waits for both before
/// returning. The walker runs on a blocking thread (it does
/// synchronous filesystem + parse work); the indexer runs as a plain async
/// task consuming the channel and writing the encoded index once at the
/// end.
async fn ingest(
    ctx: CancellationToken,
    input_root: &Path,
    tmp_blob: &Path,
    tmp_index: &Path,
) -> Result<(), StoreError> {
    let cancelled_flag = Arc::new(AtomicBool::new(false));
    let watcher_flag = cancelled_flag.clone();
    let watcher_token = ctx.clone();
    let watcher = tokio::spawn(async move {
        watcher_token.cancelled().await;
        watcher_flag.store(true, Ordering::SeqCst);
    });

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);

    let walk_root = input_root.to_path_buf();
    let walk_blob_path = tmp_blob.to_path_buf();
    let walk_cancelled = cancelled_flag.clone();
    let walk_token = ctx.clone();
    let walk_handle = tokio::task::spawn_blocking(move || -> Result<u64, StoreError> {
        let result = run_walk(&walk_root, &walk_blob_path, walk_cancelled, &tx);
        // Any walker failure cancels the indexer side too — the first
        // error cancels the other, per the ingestion contract, not just
        // the case where the indexer closed the channel first.
        if result.is_err() {
            walk_token.cancel();
        }
        result
    });

    let index_tmp_path = tmp_index.to_path_buf();
    let index_token = ctx.clone();
    let index_handle = tokio::spawn(async move {
        let mut indexer = Indexer::new();
        let mut count = 0u64;
        while let Some(meta) = rx.recv().await {
            indexer.push(&meta);
            count += 1;
            if index_token.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
        }
        let index = indexer.finish();
        let encoded = catalog_core::codec::encode(&index).map_err(StoreError::IndexDecode)?;
        let mut file = fs::File::create(&index_tmp_path).await.map_err(StoreError::from_io)?;
        file.write_all(&encoded).await.map_err(StoreError::from_io)?;
        file.sync_all().await.map_err(StoreError::from_io)?;
        debug!(sections = count, "index built");
        Ok(())
    });

    let (walk_res, index_res) = tokio::join!(walk_handle, index_handle);
    watcher.abort();

    let walk_res = walk_res
        .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))
        .and_then(|r| r.map(|_| ()));
    let index_res = index_res.map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?;

    StoreError::join(walk_res, index_res)
}

/// Walks `root`, appending each blob to `blob_path` and forwarding its
/// `Meta` to `tx`, returning the number of bytes written. Runs on a
/// blocking thread; the caller is responsible for cancelling the shared
/// token when this returns `Err`, on any of its failure paths.
fn run_walk(root: &Path, blob_path: &Path, cancelled: Arc<AtomicBool>, tx: &mpsc::Sender<Meta>) -> Result<u64, StoreError> {
    let mut file = std::fs::File::create(blob_path).map_err(StoreError::from_io)?;
    let walker = BlobWalker::new(root);
    let mut written = 0u64;
    for meta in walker.walk(cancelled)? {
        let meta = meta?;
        file.write_all(&meta.blob).map_err(StoreError::from_io)?;
        written += meta.blob.len() as u64;
        if tx.blocking_send(meta).is_err() {
            // indexer side gave up; stop promptly.
            return Err(StoreError::Cancelled);
        }
    }
    file.sync_all().map_err(StoreError::from_io)?;
    Ok(written)
}
