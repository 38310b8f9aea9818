//! Walks an input filesystem tree and yields a lazy sequence of parsed
//! catalog blobs.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::WalkError;
use crate::model::Meta;

/// Walks a directory tree, recognizing `.json`, `.yaml`, and `.yml` files as
/// catalog input. Files with any other extension are skipped; they are not
/// catalog data.
pub struct BlobWalker {
    root: PathBuf,
}

impl BlobWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Produces a lazy iterator over `Meta` records in deterministic,
    /// lexicographic-by-path order. Parsing happens on demand as the
    /// iterator is advanced, so a slow consumer bounds peak memory to
    /// roughly one input file's worth of documents.
    ///
    /// `cancelled` is polled cooperatively between files and between
    /// documents within a file; once set, the next call to `next()` returns
    /// `Some(Err(WalkError::Cancelled))` and the iterator is exhausted.
    pub fn walk(&self, cancelled: Arc<AtomicBool>) -> Result<BlobIter, WalkError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|source| WalkError::Dir {
                path: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if is_catalog_input(entry.path()) {
                paths.push(entry.path().to_path_buf());
            }
        }
        paths.sort();

        Ok(BlobIter {
            files: paths.into_iter(),
            pending: VecDeque::new(),
            cancelled,
            done: false,
        })
    }
}

fn is_catalog_input(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("yaml") | Some("yml")
    )
}

/// Lazy iterator over parsed `Meta` records produced by [`BlobWalker::walk`].
pub struct BlobIter {
    files: std::vec::IntoIter<PathBuf>,
    pending: VecDeque<Meta>,
    cancelled: Arc<AtomicBool>,
    done: bool,
}

impl Iterator for BlobIter {
    type Item = Result<Meta, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                self.done = true;
                return Some(Err(WalkError::Cancelled));
            }
            if let Some(meta) = self.pending.pop_front() {
                return Some(Ok(meta));
            }
            let path = match self.files.next() {
                Some(p) => p,
                None => {
                    self.done = true;
                    return None;
                }
            };
            match parse_file(&path) {
                Ok(metas) => self.pending.extend(metas),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn parse_file(path: &Path) -> Result<Vec<Meta>, WalkError> {
    let bytes = fs::read(path).map_err(WalkError::Io)?;
    let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"));

    let values: Vec<Value> = if is_yaml {
        let mut out = Vec::new();
        for doc in serde_yaml::Deserializer::from_slice(&bytes) {
            let value = serde_yaml::Value::deserialize(doc).map_err(|source| WalkError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
            if value.is_null() {
                continue;
            }
            let json = serde_json::to_value(value).map_err(|source| WalkError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            out.push(json);
        }
        out
    } else {
        let stream = serde_json::Deserializer::from_slice(&bytes).into_iter::<Value>();
        let mut out = Vec::new();
        for value in stream {
            let value = value.map_err(|source| WalkError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            flatten_documents(value, &mut out);
        }
        out
    };

    Ok(values.into_iter().map(value_to_meta).collect())
}

/// A `.json` file may hold a single document, a top-level array of
/// documents, or several concatenated top-level documents (JSON Lines
/// style); all three shapes are flattened to one document per blob.
fn flatten_documents(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => out.extend(items),
        other => out.push(other),
    }
}

/// Re-serializes a parsed document to its canonical blob form. `Value`'s
/// object map is key-sorted (the default, non-`preserve_order` build of
/// `serde_json`), matching the original catalog tooling's round-trip
/// through a sorted-map intermediate representation — this is why the
/// emitted key order is alphabetical regardless of source order.
fn value_to_meta(value: Value) -> Meta {
    let schema = field_str(&value, "schema");
    let package = field_str(&value, "package");
    let name = field_str(&value, "name");

    let mut blob = serde_json::to_vec(&value).expect("serde_json::Value always serializes");
    blob.push(b'\n');

    Meta::new(schema, package, name, blob)
}

fn field_str(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

use serde::Deserialize as _;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    fn flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn walks_yaml_and_json_in_lexicographic_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("b.yaml"),
            "schema: olm.channel\npackage: webhook_operator_test\nname: preview_test\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"schema":"olm.package","name":"webhook_operator_test","defaultChannel":"preview_test"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("ignored.txt"), "not catalog data").unwrap();

        let walker = BlobWalker::new(dir.path());
        let metas: Vec<Meta> = walker
            .walk(flag())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].schema, "olm.package");
        assert_eq!(metas[1].schema, "olm.channel");
        assert!(metas[0].blob.ends_with(b"\n"));
    }

    #[test]
    fn flattens_json_array_into_multiple_metas() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("bundles.json"),
            r#"[{"schema":"olm.bundle","package":"p","name":"b1"},{"schema":"olm.bundle","package":"p","name":"b2"}]"#,
        )
        .unwrap();

        let walker = BlobWalker::new(dir.path());
        let metas: Vec<Meta> = walker
            .walk(flag())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].name, "b1");
        assert_eq!(metas[1].name, "b2");
    }

    #[test]
    fn cancellation_stops_iteration() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"schema":"s"}"#).unwrap();
        fs::write(dir.path().join("z.json"), r#"{"schema":"s"}"#).unwrap();

        let cancelled = flag();
        cancelled.store(true, Ordering::SeqCst);
        let walker = BlobWalker::new(dir.path());
        let mut iter = walker.walk(cancelled).unwrap();
        assert!(matches!(iter.next(), Some(Err(WalkError::Cancelled))));
    }
}
