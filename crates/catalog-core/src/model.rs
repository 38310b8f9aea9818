//! The data model shared by the walker, indexer, codec, and query planner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single catalog blob parsed from the input tree.
///
/// `blob` is the canonical serialized form of the document, newline
/// terminated; it is the unit of storage and retrieval and is never
/// re-encoded once produced by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub schema: String,
    pub package: String,
    pub name: String,
    pub blob: Vec<u8>,
}

impl Meta {
    pub fn new(
        schema: impl Into<String>,
        package: impl Into<String>,
        name: impl Into<String>,
        blob: Vec<u8>,
    ) -> Self {
        Self {
            schema: schema.into(),
            package: package.into(),
            name: name.into(),
            blob,
        }
    }
}

/// A half-open byte range `[offset, offset+length)` in a catalog's blob file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Section {
    pub offset: u64,
    pub length: u64,
}

impl Section {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// The offset one past the last byte covered by this section.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Three inverted maps from field value to ordered section lists.
///
/// A `BTreeMap` is used rather than a hash map so that iteration order is
/// deterministic without a separate sort step, which matters for the
/// round-trip law in [`crate::codec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    pub by_schema: BTreeMap<String, Vec<Section>>,
    pub by_package: BTreeMap<String, Vec<Section>>,
    pub by_name: BTreeMap<String, Vec<Section>>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }
}
