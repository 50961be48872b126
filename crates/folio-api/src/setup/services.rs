//! Service and repository initialization

use crate::state::{AppState, DbState, LogoState, MediaState, UploadState};
use anyhow::{Context, Result};
use folio_core::Config;
use folio_db::LogoCacheRepository;
use folio_services::{
    ChunkStore, ClearbitProvider, GoogleImageSearchProvider, HttpLogoFetcher, LogoFetcher,
    LogoProvider, LogoResolver,
};
use folio_storage::Storage;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Build all services and the aggregated application state.
pub fn initialize_services(
    config: &Config,
    pool: SqlitePool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let logo_repository = LogoCacheRepository::new(pool.clone());

    let chunk_store = Arc::new(ChunkStore::new(config.uploads.clone()));
    let reap_interval = Duration::from_secs(config.uploads.session_reap_interval_secs);
    // Detached background task; it lives for the whole process.
    let _reaper = chunk_store.clone().start_reaper(reap_interval);
    tracing::info!(
        session_ttl_secs = config.uploads.session_ttl_secs,
        reap_interval_secs = config.uploads.session_reap_interval_secs,
        "Upload session reaper started"
    );

    let fetch_timeout = Duration::from_secs(config.logos.fetch_timeout_secs);
    let fetcher: Arc<dyn LogoFetcher> = Arc::new(
        HttpLogoFetcher::new(fetch_timeout).context("Failed to create logo fetcher")?,
    );

    let mut providers: Vec<Arc<dyn LogoProvider>> = Vec::new();
    if let Some((api_key, engine_id)) = config.logos.google_credentials() {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .context("Failed to create image search client")?;
        providers.push(Arc::new(GoogleImageSearchProvider::new(
            client,
            api_key.to_string(),
            engine_id.to_string(),
        )));
        tracing::info!("Keyed image search provider enabled");
    } else {
        tracing::info!("No image search credentials; using keyless logo provider only");
    }
    providers.push(Arc::new(ClearbitProvider::new(
        config.logos.clearbit_base_url.clone(),
    )));

    let resolver = Arc::new(LogoResolver::new(
        logo_repository.clone(),
        storage.clone(),
        providers,
        fetcher,
    ));

    Ok(Arc::new(AppState {
        db: DbState {
            pool,
            logo_repository,
        },
        media: MediaState {
            storage,
            limits: config.uploads.clone(),
        },
        uploads: UploadState { chunk_store },
        logos: LogoState { resolver },
        is_production: config.is_production(),
        config: config.clone(),
    }))
}
