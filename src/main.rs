use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shelfmark::catalog::SqliteCatalogStore;
use shelfmark::config::{AppConfig, CliConfig, FileConfig};
use shelfmark::enrichment::DetailCache;
use shelfmark::genre::GenreDeducer;
use shelfmark::llm::OpenAiProvider;
use shelfmark::providers::{
    ArticleClient, BookClient, MovieClient, PodcastClient, ProviderSet, TvClient,
};
use shelfmark::server::{self, run_server, RequestsLoggingLevel, ServerConfig};
use shelfmark::shelf::SqliteShelfStore;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the catalog and shelf SQLite database files.
    #[clap(long)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file; values there override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_ref()
        .map(|path| FileConfig::load(path))
        .transpose()?;
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        metrics_port: cli_args.metrics_port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening catalog database in {:?}...", config.db_dir);
    let catalog_store = Arc::new(SqliteCatalogStore::new(config.db_dir.join("catalog.db"))?);
    let shelf_store = Arc::new(SqliteShelfStore::new(config.db_dir.join("shelf.db"))?);

    info!("Initializing metrics...");
    server::metrics::init_metrics();
    server::metrics::init_catalog_metrics(catalog_store.as_ref());

    let mut providers = ProviderSet::new();
    providers.register(Arc::new(BookClient::new(
        config.providers.google_books_api_key.clone(),
    )));
    providers.register(Arc::new(PodcastClient::new()));
    providers.register(Arc::new(ArticleClient::new()));
    providers.register(Arc::new(TvClient::new(config.providers.omdb_api_key.clone())));
    match &config.providers.omdb_api_key {
        Some(key) => providers.register(Arc::new(MovieClient::new(key.clone()))),
        None => warn!("No OMDb API key configured; movie enrichment will stamp empty"),
    }

    info!(
        "Metadata providers registered for: {:?}",
        providers
            .registered_kinds()
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
    );

    let deducer = config.llm.as_ref().map(|llm| {
        info!(
            "Genre fallback deduction enabled via {} ({})",
            llm.base_url, llm.model
        );
        GenreDeducer::new(Arc::new(OpenAiProvider::new(
            llm.base_url.clone(),
            llm.model.clone(),
            llm.api_key.clone(),
        )))
    });
    if deducer.is_none() {
        info!("No [llm] config section; genre fallback deduction disabled");
    }

    let detail_cache = Arc::new(DetailCache::new(
        catalog_store.clone(),
        providers,
        deducer,
    ));

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level,
        port: config.port,
        metrics_port: config.metrics_port,
        frontend_dir_path: config.frontend_dir_path,
    };

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    run_server(server_config, catalog_store, shelf_store, detail_cache).await
}
