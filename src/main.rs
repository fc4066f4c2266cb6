use geoprogress::{
    config::ServerConfig, router, AppState, FileLocalCache, IdentityTokenConfig,
    InMemoryDocumentStore, InMemoryLocalCache, LocalCache, PostgresDocumentStore,
    ProgressController, RemoteDocumentStore, StaticRegionLookup,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoprogress=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting geography progress server");

    let config = ServerConfig::from_env()?;

    let remote: Arc<dyn RemoteDocumentStore> = match &config.database_url {
        Some(database_url) => {
            let store = PostgresDocumentStore::connect(database_url).await?;
            store.ensure_schema().await?;
            info!("Using PostgreSQL document store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, remote profiles are kept in memory");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let local: Arc<dyn LocalCache> = match &config.guest_cache_dir {
        Some(dir) => {
            info!(dir = %dir, "Using file-backed guest cache");
            Arc::new(FileLocalCache::new(dir.as_str())?)
        }
        None => Arc::new(InMemoryLocalCache::new()),
    };

    let regions = match &config.region_map_path {
        Some(path) => {
            let lookup = StaticRegionLookup::from_json_file(Path::new(path))?;
            info!(countries = lookup.len(), "Loaded region map");
            lookup
        }
        None => {
            warn!("REGION_MAP_PATH not set, regional stats will stay empty");
            StaticRegionLookup::default()
        }
    };

    let controller = ProgressController::builder(remote, local)
        .with_region_lookup(Arc::new(regions))
        .with_config(config.progress.clone())
        .build();

    let app_state = AppState::new(
        Arc::new(controller),
        IdentityTokenConfig::new(config.identity_token_secret.clone()),
    );
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(bind_addr = %config.bind_addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
