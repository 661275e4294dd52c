//! Walker scenarios against the real cache, stores and scripted providers.

mod common;

use common::{StubProvider, USER_ADA};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use shelfmark::catalog::models::{EntityDetails, EntityKind, MovieDetails};
use shelfmark::catalog::{CatalogStore, NewEntity, SqliteCatalogStore};
use shelfmark::enrichment::{DetailCache, RateLimited, ShelfWalker, WalkItem, WalkerStatus};
use shelfmark::providers::ProviderSet;
use shelfmark::shelf::{ShelfStore, SqliteShelfStore};

fn movie_patch(plot: &str) -> EntityDetails {
    EntityDetails::Movie(MovieDetails {
        plot: Some(plot.to_string()),
        ..Default::default()
    })
}

struct WalkerFixture {
    catalog_store: Arc<SqliteCatalogStore>,
    items: Vec<WalkItem>,
    cache: Arc<DetailCache>,
}

/// Shelve the given movie titles for one user and build the walk list the
/// way a session would: from the shelf listing, in insertion order.
fn fixture(titles: &[&str], providers: ProviderSet) -> WalkerFixture {
    let catalog_store = Arc::new(SqliteCatalogStore::open_in_memory().unwrap());
    let shelf_store = SqliteShelfStore::open_in_memory().unwrap();

    for title in titles {
        let entity = catalog_store
            .find_or_create(
                EntityKind::Movie,
                &NewEntity {
                    title: title.to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        shelf_store
            .add_entry(USER_ADA, EntityKind::Movie, entity.id())
            .unwrap();
    }

    let items: Vec<WalkItem> = shelf_store
        .list_entries(USER_ADA)
        .unwrap()
        .into_iter()
        .map(|entry| WalkItem {
            kind: entry.kind,
            entity_id: entry.entity_id,
            label: entry.id,
        })
        .collect();

    let cache = Arc::new(DetailCache::new(catalog_store.clone(), providers, None));

    WalkerFixture {
        catalog_store,
        items,
        cache,
    }
}

#[tokio::test]
async fn test_pause_on_rate_limit_then_resume_retries_same_entry() {
    // A succeeds, B rate-limits once then succeeds, C succeeds.
    let stub = StubProvider::new(
        EntityKind::Movie,
        vec![
            Ok(movie_patch("plot a")),
            Err(RateLimited::new("Rate limited, try again in a minute")),
            Ok(movie_patch("plot b")),
            Ok(movie_patch("plot c")),
        ],
    );
    let fixture = fixture(&["A", "B", "C"], ProviderSet::new().with(stub.clone()));
    let entity_ids: Vec<String> = fixture
        .items
        .iter()
        .map(|i| i.entity_id.clone())
        .collect();

    let walker = Arc::new(ShelfWalker::new(fixture.cache.clone(), fixture.items));
    let mut progress_rx = walker.subscribe();
    let run_walker = walker.clone();
    let handle = tokio::spawn(async move { run_walker.run(CancellationToken::new()).await });

    let paused = progress_rx
        .wait_for(|p| p.status == WalkerStatus::Paused)
        .await
        .unwrap()
        .clone();
    assert_eq!(paused.processed, 1);
    assert_eq!(paused.total, 3);
    assert_eq!(
        paused.pause_message.as_deref(),
        Some("Rate limited, try again in a minute")
    );

    // A is stamped; B is not (rate limits never stamp).
    let a = fixture
        .catalog_store
        .get_entity(EntityKind::Movie, &entity_ids[0])
        .unwrap()
        .unwrap();
    assert!(a.details_fetched_at().is_some());
    let b = fixture
        .catalog_store
        .get_entity(EntityKind::Movie, &entity_ids[1])
        .unwrap()
        .unwrap();
    assert!(b.details_fetched_at().is_none());

    walker.resume();

    let done = progress_rx
        .wait_for(|p| p.status == WalkerStatus::Completed)
        .await
        .unwrap()
        .clone();
    assert_eq!(done.processed, 3);
    handle.await.unwrap();

    // B was retried in place and C followed; everything is now stamped.
    for entity_id in &entity_ids {
        let entity = fixture
            .catalog_store
            .get_entity(EntityKind::Movie, entity_id)
            .unwrap()
            .unwrap();
        assert!(entity.details_fetched_at().is_some());
    }
    // A, B (failed), B (retry), C.
    assert_eq!(stub.call_count(), 4);
}

#[tokio::test]
async fn test_already_cached_entries_consume_no_provider_quota() {
    let stub = StubProvider::new(EntityKind::Movie, vec![Ok(movie_patch("plot"))]);
    let fixture = fixture(&["A"], ProviderSet::new().with(stub.clone()));
    let entity_id = fixture.items[0].entity_id.clone();

    // First walk enriches, second walk is all cache hits.
    let walker = ShelfWalker::new(fixture.cache.clone(), fixture.items.clone());
    walker.run(CancellationToken::new()).await;
    assert_eq!(stub.call_count(), 1);

    let walker = ShelfWalker::new(fixture.cache.clone(), fixture.items);
    walker.run(CancellationToken::new()).await;
    assert_eq!(walker.status(), WalkerStatus::Completed);
    assert_eq!(stub.call_count(), 1);

    let entity = fixture
        .catalog_store
        .get_entity(EntityKind::Movie, &entity_id)
        .unwrap()
        .unwrap();
    assert!(entity.details_fetched_at().is_some());
}

#[tokio::test]
async fn test_abandoning_a_paused_walk_leaves_later_entries_unenriched() {
    let stub = StubProvider::new(
        EntityKind::Movie,
        vec![Err(RateLimited::new("Rate limited"))],
    );
    let fixture = fixture(&["A", "B"], ProviderSet::new().with(stub));
    let entity_ids: Vec<String> = fixture
        .items
        .iter()
        .map(|i| i.entity_id.clone())
        .collect();

    let walker = Arc::new(ShelfWalker::new(fixture.cache.clone(), fixture.items));
    let shutdown = CancellationToken::new();
    let mut progress_rx = walker.subscribe();
    let run_walker = walker.clone();
    let run_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move { run_walker.run(run_shutdown).await });

    progress_rx
        .wait_for(|p| p.status == WalkerStatus::Paused)
        .await
        .unwrap();
    shutdown.cancel();
    handle.await.unwrap();

    // Nothing stamped, nothing corrupted; a future walk can pick it all up.
    for entity_id in &entity_ids {
        let entity = fixture
            .catalog_store
            .get_entity(EntityKind::Movie, entity_id)
            .unwrap()
            .unwrap();
        assert!(entity.details_fetched_at().is_none());
    }
}
