//! The entity detail cache.
//!
//! Persistence-backed memoization: `details_fetched_at` is the single
//! source of truth for cache hits. A null stamp means the next detail view
//! calls the provider; a set stamp means the stored row is returned without
//! any upstream traffic. The stamp is set on every terminal fetch outcome,
//! including "every source came up empty" — only a rate-limit leaves the
//! entity unstamped and retryable.
//!
//! Concurrent first viewers of the same entity may both reach the provider;
//! both writes are complete upserts keyed by entity id, so the persisted
//! state is well-defined whichever lands last. No locks are taken across
//! requests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use super::signal::{EnrichError, RateLimited};
use crate::catalog::merge;
use crate::catalog::models::{Entity, EntityDetails, EntityKind};
use crate::catalog::CatalogStore;
use crate::genre::{GenreDeducer, GenreHints};
use crate::providers::ProviderSet;

/// Result of a detail lookup.
#[derive(Debug)]
pub struct FetchOutcome {
    pub entity: Entity,
    /// True when the stored row was returned without contacting a provider.
    pub cached: bool,
}

/// The seam the walker drives. Implemented by [`DetailCache`]; tests
/// substitute scripted enrichers.
#[async_trait]
pub trait EntityEnricher: Send + Sync {
    async fn enrich(&self, kind: EntityKind, entity_id: &str)
        -> Result<FetchOutcome, EnrichError>;
}

pub struct DetailCache {
    store: Arc<dyn CatalogStore>,
    providers: ProviderSet,
    deducer: Option<GenreDeducer>,
}

impl DetailCache {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        providers: ProviderSet,
        deducer: Option<GenreDeducer>,
    ) -> Self {
        Self {
            store,
            providers,
            deducer,
        }
    }

    /// Return the entity's details, fetching and persisting them on first
    /// view.
    pub async fn get_or_fetch(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<FetchOutcome, EnrichError> {
        let entity = self
            .store
            .get_entity(kind, entity_id)?
            .ok_or_else(|| EnrichError::NotFound(entity_id.to_string()))?;

        if entity.details_fetched_at().is_some() {
            debug!(kind = %kind, id = %entity_id, "Details already cached");
            return Ok(FetchOutcome {
                entity,
                cached: true,
            });
        }

        let patch = self.fetch_patch(kind, &entity).await?;
        let mut merged = merge::merge(&entity.details_bag(), patch);
        self.deduce_genre_if_missing(kind, &entity, &mut merged).await;

        Ok(FetchOutcome {
            entity: self.persist(kind, entity, merged),
            cached: false,
        })
    }

    /// Bypass the cache: fetch fresh details and replace the stored bag
    /// wholesale. Fields the provider did not return become null.
    pub async fn force_refetch(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<Entity, EnrichError> {
        let entity = self
            .store
            .get_entity(kind, entity_id)?
            .ok_or_else(|| EnrichError::NotFound(entity_id.to_string()))?;

        let mut fresh = self.fetch_patch(kind, &entity).await?;
        self.deduce_genre_if_missing(kind, &entity, &mut fresh).await;

        Ok(self.persist(kind, entity, fresh))
    }

    async fn fetch_patch(
        &self,
        kind: EntityKind,
        entity: &Entity,
    ) -> Result<EntityDetails, RateLimited> {
        match self.providers.get(kind) {
            Some(client) => client.fetch_details(&entity.lookup()).await,
            None => {
                // No provider configured for this kind: enrich empty so the
                // entity is not retried on every view.
                debug!(kind = %kind, "No provider registered, stamping empty details");
                Ok(EntityDetails::empty(kind))
            }
        }
    }

    async fn deduce_genre_if_missing(
        &self,
        kind: EntityKind,
        entity: &Entity,
        details: &mut EntityDetails,
    ) {
        if details.genre().is_some() {
            return;
        }
        let Some(deducer) = &self.deducer else {
            return;
        };
        let lookup = entity.lookup();
        let hints = GenreHints {
            title: lookup.title,
            creator: lookup.creator,
            description: details.description().map(|s| s.to_string()),
            subjects: details.subjects(),
        };
        if let Some(genre) = deducer.deduce(kind, &hints).await {
            details.set_genre(genre);
        }
    }

    /// Persist the bag and stamp. On a persistence failure the caller still
    /// gets the freshly fetched data, just not durably cached.
    fn persist(&self, kind: EntityKind, entity: Entity, details: EntityDetails) -> Entity {
        let fetched_at = Utc::now().timestamp();
        if let Err(e) = self
            .store
            .put_enrichment(kind, entity.id(), &details, fetched_at)
        {
            warn!(
                "Failed to persist enrichment for {} {}: {}; returning unpersisted details",
                kind,
                entity.id(),
                e
            );
        }
        entity.with_details(details, Some(fetched_at))
    }
}

#[async_trait]
impl EntityEnricher for DetailCache {
    async fn enrich(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<FetchOutcome, EnrichError> {
        self.get_or_fetch(kind, entity_id).await
    }
}
