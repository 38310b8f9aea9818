//! Platform-agnostic catalog blob model.
//!
//! This crate contains the pure logic for turning a directory tree of
//! declarative catalog documents into a sequence of typed blobs (the
//! walker), assigning each blob a byte range in a flat file (the indexer),
//! and serializing the resulting index (the codec). No I/O runtime, no
//! HTTP, no locking — those live in `catalog-store` and `catalog-server`.

pub mod codec;
pub mod error;
pub mod indexer;
pub mod model;
pub mod planner;
pub mod walker;

pub use error::WalkError;
pub use indexer::{index_all, Indexer};
pub use model::{Index, Meta, Section};
pub use planner::plan;
pub use walker::{BlobIter, BlobWalker};
