//! Shelf membership models.

use serde::{Deserialize, Serialize};

use crate::catalog::models::EntityKind;

/// Reading/watching status of a shelf entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShelfStatus {
    Queued,
    InProgress,
    Finished,
}

impl ShelfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShelfStatus::Queued => "QUEUED",
            ShelfStatus::InProgress => "IN_PROGRESS",
            ShelfStatus::Finished => "FINISHED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "QUEUED" => Some(ShelfStatus::Queued),
            "IN_PROGRESS" => Some(ShelfStatus::InProgress),
            "FINISHED" => Some(ShelfStatus::Finished),
            _ => None,
        }
    }
}

/// A per-user shelf row referencing a shared catalog entity.
///
/// User-specific fields live here and survive independently of the entity's
/// enrichment state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShelfEntry {
    pub id: String,
    pub user_id: String,
    pub kind: EntityKind,
    pub entity_id: String,
    pub status: ShelfStatus,
    pub notes: Option<String>,
    pub priority: i64,
    /// Unix seconds; shelf listings are in insertion order.
    pub added_at: i64,
}

/// Fields a user can change on an existing entry.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShelfEntryUpdate {
    pub status: Option<ShelfStatus>,
    pub notes: Option<String>,
    pub priority: Option<i64>,
}
