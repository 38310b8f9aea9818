use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::StoreError;

/// Catalog names are restricted to lowercase alphanumerics, `-`, and `.` —
/// the same label syntax a Kubernetes object name would use, which is
/// conveniently also a safe single-path-segment filename.
pub fn validate_catalog_name(catalog: &str) -> Result<(), StoreError> {
    let valid = !catalog.is_empty()
        && catalog
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(catalog.to_string()))
    }
}

pub fn blob_path(root: &Path, catalog: &str) -> PathBuf {
    root.join(format!("{catalog}.jsonl"))
}

pub fn index_path(root: &Path, catalog: &str) -> PathBuf {
    root.join(format!("{catalog}.index.json"))
}

/// A temp file name prefixed with `.` (hidden, and sorts outside the
/// walker's recognized extensions) and suffixed with a random token so
/// concurrent `Store` calls for different catalogs never collide.
pub fn temp_path(root: &Path, catalog: &str, suffix: &str) -> PathBuf {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    root.join(format!(".{catalog}.{token}.{suffix}.tmp"))
}
