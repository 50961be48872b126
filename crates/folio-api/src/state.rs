//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only
//! what they need via Axum's `FromRef`.

use folio_core::{Config, UploadLimits};
use folio_db::LogoCacheRepository;
use folio_services::{ChunkStore, LogoResolver};
use folio_storage::Storage;
use sqlx::SqlitePool;
use std::sync::Arc;

// ----- Sub-state types -----

/// Database pool and repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub logo_repository: LogoCacheRepository,
}

/// Object store handle plus upload limits and allowlists.
#[derive(Clone)]
pub struct MediaState {
    pub storage: Arc<dyn Storage>,
    pub limits: UploadLimits,
}

/// Chunked upload session store.
#[derive(Clone)]
pub struct UploadState {
    pub chunk_store: Arc<ChunkStore>,
}

/// Logo resolution service.
#[derive(Clone)]
pub struct LogoState {
    pub resolver: Arc<LogoResolver>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub media: MediaState,
    pub uploads: UploadState,
    pub logos: LogoState,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for MediaState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for UploadState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.uploads.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for LogoState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.logos.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
