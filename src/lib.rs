//! Shelfmark Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod genre;
pub mod llm;
pub mod providers;
pub mod server;
pub mod shelf;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog::{CatalogStore, SqliteCatalogStore};
pub use enrichment::{DetailCache, EnrichError, RateLimited, ShelfWalker, WalkerStatus};
pub use server::{run_server, RequestsLoggingLevel};
pub use shelf::{ShelfStore, SqliteShelfStore};
