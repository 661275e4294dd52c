use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::error;

use super::http_layers::log_requests;
use super::metrics::{
    self, record_enrichment, OUTCOME_CACHED, OUTCOME_FETCHED, OUTCOME_RATE_LIMITED,
    OUTCOME_REFRESHED,
};
use super::state::*;
use super::ServerConfig;
use crate::catalog::models::{Entity, EntityKind};
use crate::catalog::NewEntity;
use crate::enrichment::{EnrichError, FetchOutcome};
use crate::shelf::{ShelfEntry, ShelfEntryUpdate};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

/// Map a URL kind segment to an entity kind.
fn kind_from_url(segment: &str) -> Option<EntityKind> {
    match segment {
        "book" => Some(EntityKind::Book),
        "movie" => Some(EntityKind::Movie),
        "podcast" => Some(EntityKind::Podcast),
        "show" => Some(EntityKind::TvShow),
        "article" => Some(EntityKind::Article),
        _ => None,
    }
}

#[derive(Serialize)]
struct DetailResponse {
    entity: Entity,
    cached: bool,
}

fn enrich_error_response(kind: EntityKind, err: EnrichError) -> Response {
    match err {
        EnrichError::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
        EnrichError::RateLimited(signal) => {
            record_enrichment(kind, OUTCOME_RATE_LIMITED);
            (StatusCode::TOO_MANY_REQUESTS, signal.message).into_response()
        }
        EnrichError::Store(e) => {
            error!("Store error during enrichment: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_entity_details(
    State(cache): State<GuardedDetailCache>,
    Path((kind_segment, id)): Path<(String, String)>,
) -> Response {
    let Some(kind) = kind_from_url(&kind_segment) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match cache.get_or_fetch(kind, &id).await {
        Ok(FetchOutcome { entity, cached }) => {
            record_enrichment(kind, if cached { OUTCOME_CACHED } else { OUTCOME_FETCHED });
            Json(DetailResponse { entity, cached }).into_response()
        }
        Err(err) => enrich_error_response(kind, err),
    }
}

async fn refresh_entity_details(
    State(cache): State<GuardedDetailCache>,
    Path((kind_segment, id)): Path<(String, String)>,
) -> Response {
    let Some(kind) = kind_from_url(&kind_segment) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match cache.force_refetch(kind, &id).await {
        Ok(entity) => {
            record_enrichment(kind, OUTCOME_REFRESHED);
            Json(entity).into_response()
        }
        Err(err) => enrich_error_response(kind, err),
    }
}

#[derive(Deserialize, Debug)]
struct AddShelfEntryBody {
    pub kind: EntityKind,
    pub title: String,
    pub creator: Option<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
}

#[derive(Serialize)]
struct AddShelfEntryResponse {
    entry: ShelfEntry,
    entity: Entity,
}

async fn add_shelf_entry(
    State(catalog): State<GuardedCatalogStore>,
    State(shelf): State<GuardedShelfStore>,
    Path(user_id): Path<String>,
    Json(body): Json<AddShelfEntryBody>,
) -> Response {
    if body.title.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "title must not be empty").into_response();
    }
    if body.kind == EntityKind::Article && body.url.is_none() {
        return (StatusCode::BAD_REQUEST, "articles require a url").into_response();
    }

    let new_entity = NewEntity {
        title: body.title,
        creator: body.creator,
        year: body.year,
        url: body.url,
    };
    let entity = match catalog.find_or_create(body.kind, &new_entity) {
        Ok(entity) => entity,
        Err(e) => {
            error!("Failed to find-or-create entity: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match shelf.add_entry(&user_id, body.kind, entity.id()) {
        Ok(entry) => (
            StatusCode::CREATED,
            Json(AddShelfEntryResponse { entry, entity }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to add shelf entry: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_shelf(
    State(shelf): State<GuardedShelfStore>,
    Path(user_id): Path<String>,
) -> Response {
    match shelf.list_entries(&user_id) {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            error!("Failed to list shelf entries: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn update_shelf_entry(
    State(shelf): State<GuardedShelfStore>,
    Path((user_id, entry_id)): Path<(String, String)>,
    Json(body): Json<ShelfEntryUpdate>,
) -> Response {
    match shelf.get_entry(&user_id, &entry_id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to load shelf entry: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match shelf.update_entry(&user_id, &entry_id, &body) {
        Ok(entry) => Json(entry).into_response(),
        Err(e) => {
            error!("Failed to update shelf entry: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    shelf_store: GuardedShelfStore,
    detail_cache: GuardedDetailCache,
) -> Result<Router> {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        catalog_store,
        shelf_store,
        detail_cache,
        hash: env!("GIT_HASH").to_string(),
    };

    let catalog_routes: Router = Router::new()
        .route("/{kind}/{id}/details", get(get_entity_details))
        .route("/{kind}/{id}/refresh", post(refresh_entity_details))
        .with_state(state.clone());

    let shelf_routes: Router = Router::new()
        .route("/{user_id}", get(get_shelf))
        .route("/{user_id}", post(add_shelf_entry))
        .route("/{user_id}/{entry_id}", put(update_shelf_entry))
        .with_state(state.clone());

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)).with_state(state.clone()),
    };

    let app = home_router
        .nest("/v1/catalog", catalog_routes)
        .nest("/v1/shelf", shelf_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    shelf_store: GuardedShelfStore,
    detail_cache: Arc<crate::enrichment::DetailCache>,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog_store, shelf_store, detail_cache)?;

    tokio::spawn(async move {
        if let Err(e) = metrics::run_metrics_server(metrics_port).await {
            error!("Metrics server failed: {}", e);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
