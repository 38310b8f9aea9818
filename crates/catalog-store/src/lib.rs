//! Atomic, concurrent-safe on-disk storage for catalogs, built on top of
//! `catalog-core`'s walker/indexer/codec.

pub mod error;
mod paths;
mod store;

pub use error::StoreError;
pub use paths::validate_catalog_name;
pub use store::CatalogStore;
