//! Configuration module
//!
//! Environment-driven configuration for the API service: server, database,
//! storage, upload limits, and logo resolution settings.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CHUNK_SIZE_BYTES, DEFAULT_MAX_CHUNK_COUNT, DEFAULT_SESSION_REAP_INTERVAL_SECS,
    DEFAULT_SESSION_TTL_SECS,
};
use crate::models::{MediaKind, MediaLimits};

const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const MAX_IMAGE_SIZE_MB: usize = 10;
const MAX_PDF_SIZE_MB: usize = 50;
const MAX_DOCUMENT_SIZE_MB: usize = 50;
const LOGO_FETCH_TIMEOUT_SECS: u64 = 30;

/// HTTP server and authentication settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Optional static admin key accepted in place of a JWT (compared in
    /// constant time).
    pub admin_api_key: Option<String>,
    pub environment: String,
    /// External base URL used to build public asset URLs.
    pub public_base_url: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Root directory for persisted assets.
    pub local_path: PathBuf,
}

/// Size limits and allowlists for uploads, plus chunked-upload session
/// settings.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub image_max_bytes: usize,
    pub image_allowed_extensions: Vec<String>,
    pub image_allowed_content_types: Vec<String>,
    pub pdf_max_bytes: usize,
    pub pdf_allowed_extensions: Vec<String>,
    pub pdf_allowed_content_types: Vec<String>,
    pub document_max_bytes: usize,
    pub document_allowed_extensions: Vec<String>,
    pub document_allowed_content_types: Vec<String>,
    /// Chunk size the client is expected to use. A chunk request may not
    /// exceed `max_chunk_bytes`.
    pub chunk_size_bytes: usize,
    pub max_chunk_bytes: usize,
    pub max_chunk_count: u32,
    pub session_ttl_secs: u64,
    pub session_reap_interval_secs: u64,
}

impl UploadLimits {
    /// Return size limit and allowlists for the given media kind.
    pub fn limits_for(&self, kind: MediaKind) -> MediaLimits {
        match kind {
            MediaKind::Image => MediaLimits {
                max_file_size: self.image_max_bytes,
                allowed_extensions: self.image_allowed_extensions.clone(),
                allowed_content_types: self.image_allowed_content_types.clone(),
            },
            MediaKind::Pdf => MediaLimits {
                max_file_size: self.pdf_max_bytes,
                allowed_extensions: self.pdf_allowed_extensions.clone(),
                allowed_content_types: self.pdf_allowed_content_types.clone(),
            },
            MediaKind::Document => MediaLimits {
                max_file_size: self.document_max_bytes,
                allowed_extensions: self.document_allowed_extensions.clone(),
                allowed_content_types: self.document_allowed_content_types.clone(),
            },
        }
    }

    /// Resolve the media kind from a normalized content type. This is the
    /// single place where content-type strings are interpreted; everything
    /// downstream works with the resolved `MediaKind`.
    pub fn resolve_kind(&self, content_type: &str) -> Option<MediaKind> {
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_lowercase();
        for kind in [MediaKind::Image, MediaKind::Pdf, MediaKind::Document] {
            let allowed = match kind {
                MediaKind::Image => &self.image_allowed_content_types,
                MediaKind::Pdf => &self.pdf_allowed_content_types,
                MediaKind::Document => &self.document_allowed_content_types,
            };
            if allowed.iter().any(|ct| ct.to_lowercase() == normalized) {
                return Some(kind);
            }
        }
        None
    }

    /// Largest configured per-kind size limit (used for request body caps).
    pub fn max_file_size_bytes(&self) -> usize {
        self.image_max_bytes
            .max(self.pdf_max_bytes)
            .max(self.document_max_bytes)
    }
}

/// Logo resolution settings. The keyed image-search provider is only active
/// when both `google_api_key` and `google_search_engine_id` are present.
#[derive(Clone, Debug)]
pub struct LogoConfig {
    pub google_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
    pub clearbit_base_url: String,
    pub fetch_timeout_secs: u64,
}

impl LogoConfig {
    pub fn google_credentials(&self) -> Option<(&str, &str)> {
        match (&self.google_api_key, &self.google_search_engine_id) {
            (Some(key), Some(cx)) => Some((key.as_str(), cx.as_str())),
            _ => None,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub uploads: UploadLimits,
    pub logos: LogoConfig,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let server = ServerConfig {
            port,
            cors_origins,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| JWT_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(JWT_EXPIRY_HOURS),
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|k| !k.is_empty()),
            environment,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:folio.db".to_string()),
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        };

        let storage = StorageConfig {
            local_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/files".to_string())
                .into(),
        };

        let chunk_size_bytes = parse_env_usize("UPLOAD_CHUNK_SIZE_BYTES", DEFAULT_CHUNK_SIZE_BYTES);
        let uploads = UploadLimits {
            image_max_bytes: parse_env_usize("MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB) * 1024 * 1024,
            image_allowed_extensions: parse_env_list(
                "IMAGE_ALLOWED_EXTENSIONS",
                "jpg,jpeg,png,gif,webp,svg",
            ),
            image_allowed_content_types: parse_env_list(
                "IMAGE_ALLOWED_CONTENT_TYPES",
                "image/jpeg,image/png,image/gif,image/webp,image/svg+xml",
            ),
            pdf_max_bytes: parse_env_usize("MAX_PDF_SIZE_MB", MAX_PDF_SIZE_MB) * 1024 * 1024,
            pdf_allowed_extensions: parse_env_list("PDF_ALLOWED_EXTENSIONS", "pdf"),
            pdf_allowed_content_types: parse_env_list(
                "PDF_ALLOWED_CONTENT_TYPES",
                "application/pdf",
            ),
            document_max_bytes: parse_env_usize("MAX_DOCUMENT_SIZE_MB", MAX_DOCUMENT_SIZE_MB)
                * 1024
                * 1024,
            document_allowed_extensions: parse_env_list("DOCUMENT_ALLOWED_EXTENSIONS", "doc,docx"),
            document_allowed_content_types: parse_env_list(
                "DOCUMENT_ALLOWED_CONTENT_TYPES",
                "application/msword,application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
            chunk_size_bytes,
            // Leave headroom for clients that round chunk boundaries up.
            max_chunk_bytes: parse_env_usize("UPLOAD_MAX_CHUNK_BYTES", chunk_size_bytes * 2),
            max_chunk_count: env::var("UPLOAD_MAX_CHUNK_COUNT")
                .unwrap_or_else(|_| DEFAULT_MAX_CHUNK_COUNT.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_CHUNK_COUNT),
            session_ttl_secs: parse_env_u64("UPLOAD_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            session_reap_interval_secs: parse_env_u64(
                "UPLOAD_SESSION_REAP_INTERVAL_SECS",
                DEFAULT_SESSION_REAP_INTERVAL_SECS,
            ),
        };

        let logos = LogoConfig {
            google_api_key: env::var("GOOGLE_SEARCH_API_KEY").ok().filter(|k| !k.is_empty()),
            google_search_engine_id: env::var("GOOGLE_SEARCH_ENGINE_ID")
                .ok()
                .filter(|k| !k.is_empty()),
            clearbit_base_url: env::var("CLEARBIT_BASE_URL")
                .unwrap_or_else(|_| "https://logo.clearbit.com".to_string()),
            fetch_timeout_secs: parse_env_u64("LOGO_FETCH_TIMEOUT_SECS", LOGO_FETCH_TIMEOUT_SECS),
        };

        let config = Config {
            server,
            database,
            storage,
            uploads,
            logos,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.jwt_secret.len() < 16 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 16 characters long"
            ));
        }
        if self.uploads.chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("UPLOAD_CHUNK_SIZE_BYTES must be greater than 0"));
        }
        if self.uploads.max_chunk_count == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_CHUNK_COUNT must be greater than 0"));
        }
        if self.uploads.session_ttl_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_SESSION_TTL_SECS must be greater than 0"));
        }
        if self.logos.google_api_key.is_some() != self.logos.google_search_engine_id.is_some() {
            return Err(anyhow::anyhow!(
                "GOOGLE_SEARCH_API_KEY and GOOGLE_SEARCH_ENGINE_ID must be set together"
            ));
        }
        Ok(())
    }
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

fn parse_env_list(name: &str, default: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
