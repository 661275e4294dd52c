//! CatalogStore trait definition.
//!
//! Abstracts catalog persistence so the server and tests can share an
//! interface. Enrichment writes are complete, self-contained upserts keyed
//! by entity id: concurrent writers converge to the last landed write.

use anyhow::Result;

use super::models::{Entity, EntityDetails, EntityKind};

/// Identifying fields for find-or-create. Enrichment fields are never set
/// at creation time.
#[derive(Clone, Debug, Default)]
pub struct NewEntity {
    pub title: String,
    /// Author / director / publisher / creator, depending on kind.
    pub creator: Option<String>,
    pub year: Option<i32>,
    /// Canonical URL; required for articles, ignored elsewhere.
    pub url: Option<String>,
}

pub trait CatalogStore: Send + Sync {
    /// Get an entity by id.
    fn get_entity(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>>;

    /// Find an entity by its natural key (title + creator, or URL for
    /// articles) or create it with identifying fields only.
    fn find_or_create(&self, kind: EntityKind, new: &NewEntity) -> Result<Entity>;

    /// Write the full details bag and stamp `details_fetched_at`.
    ///
    /// This is the single write path for both merge-on-success and
    /// replace-on-force-refetch; callers decide what bag to pass.
    fn put_enrichment(
        &self,
        kind: EntityKind,
        id: &str,
        details: &EntityDetails,
        fetched_at: i64,
    ) -> Result<()>;

    /// Administrative action: clear the stamp so the next detail view
    /// fetches again (e.g. after correcting a mis-set author).
    fn clear_enrichment_stamp(&self, kind: EntityKind, id: &str) -> Result<()>;

    /// Number of entities of the given kind (for metrics).
    fn entity_count(&self, kind: EntityKind) -> Result<i64>;
}
