//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p folio-api`. Uses an in-memory
//! SQLite database and a tempdir-backed local store; logo providers and the
//! image fetcher are injected so no test touches the network.
#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::{TestResponse, TestServer};
use bytes::Bytes;
use folio_api::auth;
use folio_api::constants;
use folio_api::setup::routes;
use folio_api::state::{AppState, DbState, LogoState, MediaState, UploadState};
use folio_core::models::LogoSource;
use folio_core::{
    AppError, Config, DatabaseConfig, LogoConfig, ServerConfig, StorageConfig, UploadLimits,
};
use folio_db::LogoCacheRepository;
use folio_services::{ChunkStore, FetchedImage, LogoFetcher, LogoProvider, LogoResolver};
use folio_storage::{LocalStorage, Storage};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "folio-test-secret-0123456789";
pub const TEST_BASE_URL: &str = "http://localhost:4000";
pub const MULTIPART_BOUNDARY: &str = "folio-test-boundary";

/// Versioned API path, e.g. `api_path("/uploads")` -> `/api/v0/uploads`.
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, pool, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// `Authorization` header value with a freshly minted admin JWT.
    pub fn bearer(&self) -> String {
        let token = auth::issue_token(TEST_JWT_SECRET, 1).expect("Failed to issue token");
        format!("Bearer {}", token)
    }

    /// Turn a public asset URL into the request path the test server accepts.
    pub fn asset_path(url: &str) -> String {
        url.strip_prefix(TEST_BASE_URL)
            .unwrap_or_else(|| panic!("URL {} not rooted at {}", url, TEST_BASE_URL))
            .to_string()
    }
}

/// Setup a test app with no logo providers and a fetcher that always
/// succeeds. Enough for upload and auth tests.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_logo(Vec::new(), Arc::new(StaticFetcher::png(b"logo bytes".to_vec())))
        .await
}

/// Setup a test app with injected logo providers and fetcher.
pub async fn setup_test_app_with_logo(
    providers: Vec<Arc<dyn LogoProvider>>,
    fetcher: Arc<dyn LogoFetcher>,
) -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            temp_dir.path(),
            format!("{}{}", TEST_BASE_URL, constants::FILES_PREFIX),
        )
        .await
        .expect("Failed to create local storage"),
    );

    let config = create_test_config();

    let logo_repository = LogoCacheRepository::new(pool.clone());
    let chunk_store = Arc::new(ChunkStore::new(config.uploads.clone()));
    let resolver = Arc::new(LogoResolver::new(
        logo_repository.clone(),
        storage.clone(),
        providers,
        fetcher,
    ));

    let state = Arc::new(AppState {
        db: DbState {
            pool: pool.clone(),
            logo_repository,
        },
        media: MediaState {
            storage,
            limits: config.uploads.clone(),
        },
        uploads: UploadState { chunk_store },
        logos: LogoState { resolver },
        is_production: false,
        config: config.clone(),
    });

    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        pool,
        _temp_dir: temp_dir,
    }
}

fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            port: 4000,
            cors_origins: vec!["*".to_string()],
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_expiry_hours: 1,
            admin_api_key: Some("folio-test-admin-key".to_string()),
            environment: "test".to_string(),
            public_base_url: TEST_BASE_URL.to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_seconds: 5,
        },
        storage: StorageConfig {
            local_path: "./unused-in-tests".into(),
        },
        uploads: UploadLimits {
            image_max_bytes: 10 * 1024 * 1024,
            image_allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into(), "bin".into()],
            image_allowed_content_types: vec![
                "image/png".into(),
                "image/jpeg".into(),
                "application/octet-stream".into(),
            ],
            pdf_max_bytes: 50 * 1024 * 1024,
            pdf_allowed_extensions: vec!["pdf".into()],
            pdf_allowed_content_types: vec!["application/pdf".into()],
            document_max_bytes: 50 * 1024 * 1024,
            document_allowed_extensions: vec!["doc".into(), "docx".into()],
            document_allowed_content_types: vec![
                "application/msword".into(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
            ],
            chunk_size_bytes: 2 * 1024 * 1024,
            max_chunk_bytes: 4 * 1024 * 1024,
            max_chunk_count: 64,
            session_ttl_secs: 1800,
            session_reap_interval_secs: 60,
        },
        logos: LogoConfig {
            google_api_key: None,
            google_search_engine_id: None,
            clearbit_base_url: "https://logo.clearbit.com".to_string(),
            fetch_timeout_secs: 5,
        },
    }
}

// ----- Multipart helpers -----

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}

/// Build a multipart body with the given text fields and an optional binary
/// part named "file".
pub fn multipart_body(
    text_fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                MULTIPART_BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// Post one chunk of a chunked upload.
pub async fn post_chunk(
    app: &TestApp,
    upload_id: &str,
    chunk_index: u32,
    total_chunks: u32,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> TestResponse {
    let index = chunk_index.to_string();
    let total = total_chunks.to_string();
    let body = multipart_body(
        &[
            ("uploadId", upload_id),
            ("chunkIndex", &index),
            ("totalChunks", &total),
            ("fileName", file_name),
            ("contentType", content_type),
        ],
        Some((file_name, content_type, bytes)),
    );

    app.client()
        .post(&api_path("/uploads/chunks"))
        .add_header("Authorization", app.bearer())
        .content_type(&multipart_content_type())
        .bytes(Bytes::from(body))
        .await
}

/// Post a direct (single-request) upload.
pub async fn post_upload(
    app: &TestApp,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> TestResponse {
    let body = multipart_body(&[], Some((file_name, content_type, bytes)));

    app.client()
        .post(&api_path("/uploads"))
        .add_header("Authorization", app.bearer())
        .content_type(&multipart_content_type())
        .bytes(Bytes::from(body))
        .await
}

// ----- Logo provider / fetcher doubles -----

/// Provider returning a fixed candidate URL and counting lookups.
pub struct StaticProvider {
    source: LogoSource,
    url: Option<String>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(source: LogoSource, url: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            source,
            url: url.map(String::from),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogoProvider for StaticProvider {
    fn source(&self) -> LogoSource {
        self.source
    }

    async fn find_logo_url(&self, _name: &str) -> Result<Option<String>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.url.clone())
    }
}

/// Fetcher returning fixed PNG bytes.
pub struct StaticFetcher {
    bytes: Vec<u8>,
}

impl StaticFetcher {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

#[async_trait]
impl LogoFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedImage, AppError> {
        Ok(FetchedImage {
            bytes: self.bytes.clone(),
            content_type: Some("image/png".to_string()),
        })
    }
}

/// Fetcher behaving like a provider whose guessed image does not exist.
pub struct NotFoundFetcher;

#[async_trait]
impl LogoFetcher for NotFoundFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, AppError> {
        Err(AppError::NotFound(format!(
            "No logo image available at {}",
            url
        )))
    }
}
