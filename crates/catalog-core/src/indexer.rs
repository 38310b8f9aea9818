//! Assigns file sections to each `Meta` and builds the three inverted
//! maps.

use crate::model::{Index, Meta, Section};

/// Consumes `Meta` records one at a time, tracking a byte cursor and
/// building an [`Index`]. The cursor starts at zero and advances by each
/// blob's length, so sections are assigned in the same order `Meta`s are
/// pushed — callers that write blob bytes to a file in that same order get
/// an index whose offsets match the file layout exactly.
#[derive(Debug, Default)]
pub struct Indexer {
    cursor: u64,
    index: Index,
}

impl Indexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes one `Meta`, returning the `Section` it was assigned.
    pub fn push(&mut self, meta: &Meta) -> Section {
        let section = Section::new(self.cursor, meta.blob.len() as u64);
        self.cursor += section.length;

        if !meta.schema.is_empty() {
            self.index
                .by_schema
                .entry(meta.schema.clone())
                .or_default()
                .push(section);
        }
        if !meta.package.is_empty() {
            self.index
                .by_package
                .entry(meta.package.clone())
                .or_default()
                .push(section);
        }
        if !meta.name.is_empty() {
            self.index
                .by_name
                .entry(meta.name.clone())
                .or_default()
                .push(section);
        }

        section
    }

    /// Total bytes indexed so far; equals the blob file's length once all
    /// `Meta`s from a walk have been pushed.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn finish(self) -> Index {
        self.index
    }
}

/// Indexes a complete sequence of `Meta` at once. Convenience wrapper
/// around [`Indexer`] for callers (tests, offline tooling) that don't need
/// to interleave indexing with writing blob bytes.
pub fn index_all<I: IntoIterator<Item = Meta>>(metas: I) -> Index {
    let mut indexer = Indexer::new();
    for meta in metas {
        indexer.push(&meta);
    }
    indexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_contiguous_non_overlapping_sections() {
        let metas = vec![
            Meta::new("olm.package", "", "webhook_operator_test", b"aaa\n".to_vec()),
            Meta::new("olm.channel", "webhook_operator_test", "preview_test", b"bb\n".to_vec()),
            Meta::new(
                "olm.bundle",
                "webhook_operator_test",
                "bundle.v0.0.1",
                b"cccc\n".to_vec(),
            ),
        ];
        let index = index_all(metas);

        assert_eq!(index.by_schema["olm.package"], vec![Section::new(0, 4)]);
        assert_eq!(index.by_schema["olm.channel"], vec![Section::new(4, 3)]);
        assert_eq!(index.by_schema["olm.bundle"], vec![Section::new(7, 5)]);
        assert_eq!(
            index.by_package["webhook_operator_test"],
            vec![Section::new(4, 3), Section::new(7, 5)]
        );
        assert_eq!(index.by_name["bundle.v0.0.1"], vec![Section::new(7, 5)]);
        assert!(!index.by_package.contains_key(""));
    }

    #[test]
    fn empty_fields_are_not_indexed() {
        let mut indexer = Indexer::new();
        indexer.push(&Meta::new("", "", "", b"x\n".to_vec()));
        let index = indexer.finish();
        assert!(index.by_schema.is_empty());
        assert!(index.by_package.is_empty());
        assert!(index.by_name.is_empty());
    }
}
