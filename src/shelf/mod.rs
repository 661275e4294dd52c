//! Per-user shelf memberships.

pub mod models;
mod store;

pub use models::{ShelfEntry, ShelfEntryUpdate, ShelfStatus};
pub use store::{ShelfStore, SqliteShelfStore};
