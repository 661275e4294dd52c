use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;
use crate::catalog::CatalogStore;
use crate::enrichment::DetailCache;
use crate::shelf::ShelfStore;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedShelfStore = Arc<dyn ShelfStore>;
pub type GuardedDetailCache = Arc<DetailCache>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub shelf_store: GuardedShelfStore,
    pub detail_cache: GuardedDetailCache,
    pub hash: String,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for GuardedShelfStore {
    fn from_ref(input: &ServerState) -> Self {
        input.shelf_store.clone()
    }
}

impl FromRef<ServerState> for GuardedDetailCache {
    fn from_ref(input: &ServerState) -> Self {
        input.detail_cache.clone()
    }
}
