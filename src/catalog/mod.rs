//! Catalog entities and their persistence.
//!
//! The catalog is shared across users: one row per book/movie/podcast/TV
//! show/article, created on first reference and enriched lazily by the
//! enrichment cache.

pub mod merge;
pub mod models;
pub mod schema;
mod sqlite_store;
mod store;

pub use sqlite_store::SqliteCatalogStore;
pub use store::{CatalogStore, NewEntity};
