//! Metadata provider clients, one per entity kind.
//!
//! Each client wraps one or more upstream APIs and normalizes their
//! responses into the kind's details bag. Quota exhaustion
//! ([`RateLimited`]) is the only failure that escapes a client; any other
//! upstream problem (network, malformed body, not-found) is absorbed per
//! source, so a partial outage just means fewer populated fields.

mod articles;
mod books;
mod movies;
mod omdb;
mod podcasts;
mod tv;

pub use articles::ArticleClient;
pub use books::BookClient;
pub use movies::MovieClient;
pub use podcasts::PodcastClient;
pub use tv::TvClient;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::models::{EntityDetails, EntityKind, EntityLookup};
use crate::enrichment::RateLimited;

/// Timeout applied to every upstream metadata request.
pub(crate) const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .build()
        .expect("Failed to create HTTP client")
}

/// A metadata client for one entity kind.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Fetch and normalize details for the given identifying fields.
    ///
    /// Returns an all-absent bag rather than an error when every source
    /// came up empty.
    async fn fetch_details(&self, lookup: &EntityLookup) -> Result<EntityDetails, RateLimited>;
}

/// Registry of provider clients by kind. Kinds without a registered client
/// are enriched to an empty bag by the cache.
#[derive(Clone, Default)]
pub struct ProviderSet {
    clients: HashMap<EntityKind, Arc<dyn MetadataClient>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client: Arc<dyn MetadataClient>) {
        self.clients.insert(client.kind(), client);
    }

    pub fn with(mut self, client: Arc<dyn MetadataClient>) -> Self {
        self.register(client);
        self
    }

    pub fn get(&self, kind: EntityKind) -> Option<&Arc<dyn MetadataClient>> {
        self.clients.get(&kind)
    }

    pub fn registered_kinds(&self) -> Vec<EntityKind> {
        self.clients.keys().copied().collect()
    }
}
