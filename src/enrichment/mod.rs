//! On-demand external-metadata enrichment.
//!
//! Entities are enriched the first time their details are viewed and never
//! again unless explicitly forced. The cache owns the fetch-merge-stamp
//! protocol, the signal module the typed rate-limit failure, and the walker
//! the sequential pause/resume sweep across a whole shelf.

pub mod cache;
pub mod signal;
pub mod walker;

pub use cache::{DetailCache, EntityEnricher, FetchOutcome};
pub use signal::{EnrichError, RateLimited};
pub use walker::{ShelfWalker, WalkItem, WalkerProgress, WalkerStatus};
