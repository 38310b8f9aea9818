use std::sync::Arc;

use catalog_store::CatalogStore;

use crate::index_loader::IndexLoader;

/// Shared across every request handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub store: Arc<CatalogStore>,
    pub index_loader: Arc<IndexLoader>,
    pub url_prefix: String,
    pub gzip_threshold_bytes: usize,
}
