//! Test server lifecycle management.

use std::sync::Arc;
use tokio::net::TcpListener;

use shelfmark::catalog::SqliteCatalogStore;
use shelfmark::enrichment::DetailCache;
use shelfmark::providers::ProviderSet;
use shelfmark::server::{make_app, ServerConfig};
use shelfmark::shelf::SqliteShelfStore;

pub struct TestServer {
    pub base_url: String,
    pub catalog_store: Arc<SqliteCatalogStore>,
    pub shelf_store: Arc<SqliteShelfStore>,
}

impl TestServer {
    /// Spawn an isolated server with the given provider clients.
    pub async fn spawn(providers: ProviderSet) -> Self {
        let catalog_store = Arc::new(SqliteCatalogStore::open_in_memory().unwrap());
        let shelf_store = Arc::new(SqliteShelfStore::open_in_memory().unwrap());
        let detail_cache = Arc::new(DetailCache::new(
            catalog_store.clone(),
            providers,
            None,
        ));

        let config = ServerConfig {
            // Keep e2e logs quiet.
            requests_logging_level: shelfmark::RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app = make_app(
            config,
            catalog_store.clone(),
            shelf_store.clone(),
            detail_cache,
        )
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{}", addr),
            catalog_store,
            shelf_store,
        }
    }

    /// Spawn with no providers registered at all.
    pub async fn spawn_bare() -> Self {
        Self::spawn(ProviderSet::new()).await
    }
}
