//! Shelf membership persistence.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::models::{ShelfEntry, ShelfEntryUpdate, ShelfStatus};
use crate::catalog::models::EntityKind;
use crate::sqlite_persistence::{migrate_if_needed, VersionedSchema};

const SHELF_SCHEMA_V0: &str = "
CREATE TABLE shelf_entries (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'QUEUED',
    notes TEXT,
    priority INTEGER NOT NULL DEFAULT 0,
    added_at INTEGER NOT NULL,
    UNIQUE (user_id, kind, entity_id)
);
CREATE INDEX idx_shelf_entries_user ON shelf_entries(user_id);
";

const SHELF_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    create_sql: SHELF_SCHEMA_V0,
    migration: None,
}];

pub trait ShelfStore: Send + Sync {
    /// Add an entity to a user's shelf; returns the existing entry when the
    /// user already shelved it.
    fn add_entry(&self, user_id: &str, kind: EntityKind, entity_id: &str) -> Result<ShelfEntry>;

    /// All of a user's entries in insertion order.
    fn list_entries(&self, user_id: &str) -> Result<Vec<ShelfEntry>>;

    fn get_entry(&self, user_id: &str, entry_id: &str) -> Result<Option<ShelfEntry>>;

    fn update_entry(
        &self,
        user_id: &str,
        entry_id: &str,
        update: &ShelfEntryUpdate,
    ) -> Result<ShelfEntry>;
}

#[derive(Clone)]
pub struct SqliteShelfStore {
    conn: Arc<Mutex<Connection>>,
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<ShelfEntry> {
    let kind_raw: String = row.get(2)?;
    let status_raw: String = row.get(4)?;
    Ok(ShelfEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: EntityKind::from_str(&kind_raw).unwrap_or(EntityKind::Book),
        entity_id: row.get(3)?,
        status: ShelfStatus::from_str(&status_raw).unwrap_or(ShelfStatus::Queued),
        notes: row.get(5)?,
        priority: row.get(6)?,
        added_at: row.get(7)?,
    })
}

const ENTRY_COLUMNS: &str = "id, user_id, kind, entity_id, status, notes, priority, added_at";

impl SqliteShelfStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn =
            Connection::open(db_path.as_ref()).context("Failed to open shelf database")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrate_if_needed(&mut conn, "shelf", SHELF_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrate_if_needed(&mut conn, "shelf", SHELF_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl ShelfStore for SqliteShelfStore {
    fn add_entry(&self, user_id: &str, kind: EntityKind, entity_id: &str) -> Result<ShelfEntry> {
        let conn = self.conn.lock().unwrap();

        let existing = conn
            .query_row(
                &format!(
                    "SELECT {} FROM shelf_entries WHERE user_id = ?1 AND kind = ?2 AND entity_id = ?3",
                    ENTRY_COLUMNS
                ),
                params![user_id, kind.as_str(), entity_id],
                row_to_entry,
            )
            .optional()?;
        if let Some(entry) = existing {
            return Ok(entry);
        }

        let id = Uuid::new_v4().to_string();
        let added_at = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO shelf_entries (id, user_id, kind, entity_id, status, added_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                user_id,
                kind.as_str(),
                entity_id,
                ShelfStatus::Queued.as_str(),
                added_at
            ],
        )?;

        conn.query_row(
            &format!("SELECT {} FROM shelf_entries WHERE id = ?1", ENTRY_COLUMNS),
            params![id],
            row_to_entry,
        )
        .context("Shelf entry vanished after insert")
    }

    fn list_entries(&self, user_id: &str) -> Result<Vec<ShelfEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM shelf_entries WHERE user_id = ?1 ORDER BY added_at, rowid",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![user_id], row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn get_entry(&self, user_id: &str, entry_id: &str) -> Result<Option<ShelfEntry>> {
        let conn = self.conn.lock().unwrap();
        let entry = conn
            .query_row(
                &format!(
                    "SELECT {} FROM shelf_entries WHERE user_id = ?1 AND id = ?2",
                    ENTRY_COLUMNS
                ),
                params![user_id, entry_id],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn update_entry(
        &self,
        user_id: &str,
        entry_id: &str,
        update: &ShelfEntryUpdate,
    ) -> Result<ShelfEntry> {
        let conn = self.conn.lock().unwrap();

        let updated = conn.execute(
            "UPDATE shelf_entries SET \
             status = COALESCE(?1, status), \
             notes = COALESCE(?2, notes), \
             priority = COALESCE(?3, priority) \
             WHERE user_id = ?4 AND id = ?5",
            params![
                update.status.map(|s| s.as_str()),
                update.notes,
                update.priority,
                user_id,
                entry_id
            ],
        )?;
        if updated == 0 {
            bail!("No shelf entry {} for user {}", entry_id, user_id);
        }

        conn.query_row(
            &format!(
                "SELECT {} FROM shelf_entries WHERE user_id = ?1 AND id = ?2",
                ENTRY_COLUMNS
            ),
            params![user_id, entry_id],
            row_to_entry,
        )
        .context("Shelf entry vanished after update")
    }
}
