//! End-to-end tests for the detail enrichment endpoints.
//!
//! Covers first-view fetching, cache hits, 429 propagation with the
//! signal's message, and force refresh replacing stored fields.

mod common;

use common::{StubProvider, TestClient, TestServer, BOOK_TITLE, MOVIE_TITLE, USER_ADA};
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};

use shelfmark::catalog::models::{EntityDetails, EntityKind, MovieDetails};
use shelfmark::enrichment::RateLimited;
use shelfmark::providers::ProviderSet;

fn movie_patch(plot: &str, poster: Option<&str>) -> EntityDetails {
    EntityDetails::Movie(MovieDetails {
        plot: Some(plot.to_string()),
        poster_url: poster.map(|s| s.to_string()),
        ..Default::default()
    })
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn test_first_view_fetches_then_serves_cached() {
    let stub = StubProvider::new(
        EntityKind::Movie,
        vec![Ok(movie_patch("A linguist decodes an alien language.", None))],
    );
    let server = TestServer::spawn(ProviderSet::new().with(stub.clone())).await;
    let client = TestClient::new(server.base_url.clone());

    let entity_id = client
        .shelve_and_get_entity_id(USER_ADA, json!({"kind": "movie", "title": MOVIE_TITLE}))
        .await;

    let response = client.get_details("movie", &entity_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["cached"], false);
    assert_eq!(
        body["entity"]["plot"],
        "A linguist decodes an alien language."
    );
    assert!(body["entity"]["details_fetched_at"].is_i64());

    let response = client.get_details("movie", &entity_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["cached"], true);
    assert_eq!(
        body["entity"]["plot"],
        "A linguist decodes an alien language."
    );

    // The memoization guarantee: one provider call across both views.
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn test_kind_without_provider_still_stamps() {
    let server = TestServer::spawn_bare().await;
    let client = TestClient::new(server.base_url.clone());

    let entity_id = client
        .shelve_and_get_entity_id(
            USER_ADA,
            json!({"kind": "book", "title": BOOK_TITLE}),
        )
        .await;

    let response = client.get_details("book", &entity_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["cached"], false);
    assert!(body["entity"]["details_fetched_at"].is_i64());

    let response = client.get_details("book", &entity_id).await;
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["cached"], true);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_surfaces_as_429_with_message() {
    let stub = StubProvider::new(
        EntityKind::Movie,
        vec![
            Err(RateLimited::new(
                "OMDb rate limit reached, try again in a minute",
            )),
            Ok(movie_patch("plot", None)),
        ],
    );
    let server = TestServer::spawn(ProviderSet::new().with(stub.clone())).await;
    let client = TestClient::new(server.base_url.clone());

    let entity_id = client
        .shelve_and_get_entity_id(USER_ADA, json!({"kind": "movie", "title": MOVIE_TITLE}))
        .await;

    let response = client.get_details("movie", &entity_id).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.text().await.unwrap(),
        "OMDb rate limit reached, try again in a minute"
    );

    // The failed fetch did not stamp: the next view fetches and succeeds.
    let response = client.get_details("movie", &entity_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["cached"], false);
    assert_eq!(stub.call_count(), 2);
}

// =============================================================================
// Force refresh
// =============================================================================

#[tokio::test]
async fn test_force_refresh_replaces_stored_fields() {
    let stub = StubProvider::new(
        EntityKind::Movie,
        vec![
            Ok(movie_patch("plot", Some("https://img.example/poster.jpg"))),
            // The refetched response lacks the poster.
            Ok(movie_patch("newer plot", None)),
        ],
    );
    let server = TestServer::spawn(ProviderSet::new().with(stub.clone())).await;
    let client = TestClient::new(server.base_url.clone());

    let entity_id = client
        .shelve_and_get_entity_id(USER_ADA, json!({"kind": "movie", "title": MOVIE_TITLE}))
        .await;

    let response = client.get_details("movie", &entity_id).await;
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["entity"]["poster_url"], "https://img.example/poster.jpg");

    let response = client.refresh("movie", &entity_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed: JsonValue = response.json().await.unwrap();
    assert_eq!(refreshed["plot"], "newer plot");
    // Replace, not merge: the poster is gone.
    assert!(refreshed["poster_url"].is_null());

    // And the replacement stuck.
    let response = client.get_details("movie", &entity_id).await;
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["cached"], true);
    assert!(body["entity"]["poster_url"].is_null());
}

#[tokio::test]
async fn test_refresh_propagates_rate_limit() {
    let stub = StubProvider::new(
        EntityKind::Movie,
        vec![
            Ok(movie_patch("plot", None)),
            Err(RateLimited::new("Rate limited, try again in a minute")),
        ],
    );
    let server = TestServer::spawn(ProviderSet::new().with(stub)).await;
    let client = TestClient::new(server.base_url.clone());

    let entity_id = client
        .shelve_and_get_entity_id(USER_ADA, json!({"kind": "movie", "title": MOVIE_TITLE}))
        .await;
    client.get_details("movie", &entity_id).await;

    let response = client.refresh("movie", &entity_id).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.text().await.unwrap(),
        "Rate limited, try again in a minute"
    );
}

// =============================================================================
// Not found
// =============================================================================

#[tokio::test]
async fn test_unknown_entity_returns_404() {
    let server = TestServer::spawn_bare().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_details("movie", "no-such-id").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.refresh("movie", "no-such-id").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_kind_returns_404() {
    let server = TestServer::spawn_bare().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_details("vinyl", "some-id").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
