//! Shared SQLite schema versioning.
//!
//! Each store declares an ordered list of [`VersionedSchema`]s. A brand new
//! database is created directly at the latest version; an existing one is
//! walked through the pending migrations inside a single transaction.
//! The schema version is tracked in `PRAGMA user_version`, offset by
//! [`BASE_DB_VERSION`] to distinguish versioned databases from files some
//! other tool initialized.

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

pub const BASE_DB_VERSION: usize = 41000;

pub struct VersionedSchema {
    pub version: usize,
    /// Full schema at this version, as an executable SQL batch.
    pub create_sql: &'static str,
    /// Migration from the previous version. None only for version 0.
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(self.create_sql)?;
        conn.pragma_update(None, "user_version", (BASE_DB_VERSION + self.version) as i64)?;
        Ok(())
    }
}

/// Bring `conn` up to the latest schema version.
pub fn migrate_if_needed(
    conn: &mut Connection,
    db_name: &str,
    schemas: &[VersionedSchema],
) -> Result<()> {
    let Some(latest) = schemas.last() else {
        bail!("No schemas declared for {} database", db_name);
    };

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating {} db schema at version {}", db_name, latest.version);
        latest.create(conn)?;
        return Ok(());
    }

    let mut current_version = if db_version < BASE_DB_VERSION as i64 {
        // Pre-versioning database, treat as version 0.
        0
    } else {
        (db_version - BASE_DB_VERSION as i64) as usize
    };

    if current_version >= latest.version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let start_version = current_version;
    for schema in schemas.iter().filter(|s| s.version > start_version) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating {} db from version {} to {}",
                db_name, current_version, schema.version
            );
            migration_fn(&tx)?;
        }
        current_version = schema.version;
    }
    tx.pragma_update(
        None,
        "user_version",
        (BASE_DB_VERSION + current_version) as i64,
    )?;
    tx.commit()?;
    Ok(())
}
