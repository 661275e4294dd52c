use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::{error, info};

use crate::catalog::models::EntityKind;
use crate::catalog::CatalogStore;

/// Metric name prefix for all shelfmark metrics
const PREFIX: &str = "shelfmark";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Enrichment Metrics
    pub static ref ENRICHMENT_FETCHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_enrichment_fetches_total"),
            "Detail lookups by entity kind and outcome"
        ),
        &["kind", "outcome"]
    ).expect("Failed to create enrichment_fetches_total metric");

    // Catalog Metrics
    pub static ref CATALOG_ENTITIES: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_catalog_entities"), "Catalog entities by kind"),
        &["kind"]
    ).expect("Failed to create catalog_entities metric");
}

/// Enrichment lookup outcomes recorded against ENRICHMENT_FETCHES_TOTAL.
pub const OUTCOME_CACHED: &str = "cached";
pub const OUTCOME_FETCHED: &str = "fetched";
pub const OUTCOME_RATE_LIMITED: &str = "rate_limited";
pub const OUTCOME_REFRESHED: &str = "refreshed";

/// Register all metrics with the global registry. Call once at startup.
pub fn init_metrics() {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(ENRICHMENT_FETCHES_TOTAL.clone()),
        Box::new(CATALOG_ENTITIES.clone()),
    ];
    for metric in metrics {
        if let Err(e) = REGISTRY.register(metric) {
            error!("Failed to register metric: {}", e);
        }
    }
}

/// Seed the catalog gauges from current store counts.
pub fn init_catalog_metrics(store: &dyn CatalogStore) {
    for kind in [
        EntityKind::Book,
        EntityKind::Movie,
        EntityKind::Podcast,
        EntityKind::TvShow,
        EntityKind::Article,
    ] {
        match store.entity_count(kind) {
            Ok(count) => CATALOG_ENTITIES
                .with_label_values(&[kind.as_str()])
                .set(count as f64),
            Err(e) => error!("Failed to count {} entities: {}", kind, e),
        }
    }
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_enrichment(kind: EntityKind, outcome: &str) {
    ENRICHMENT_FETCHES_TOTAL
        .with_label_values(&[kind.as_str(), outcome])
        .inc();
}

/// Handler for the /metrics endpoint (Prometheus text format).
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve /metrics on its own port, detached from the main app.
pub async fn run_metrics_server(port: u16) -> anyhow::Result<()> {
    let app = axum::Router::new().route("/metrics", axum::routing::get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Metrics listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
