//! Downloading candidate logo images.

use async_trait::async_trait;
use folio_core::AppError;
use std::time::Duration;

/// Downloaded image bytes plus the content type the source reported.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Seam for downloading candidate images, so resolution logic can be tested
/// without the network.
#[async_trait]
pub trait LogoFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, AppError>;
}

/// HTTP implementation backed by a shared reqwest client.
pub struct HttpLogoFetcher {
    client: reqwest::Client,
}

impl HttpLogoFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LogoFetcher for HttpLogoFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Logo download failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "No logo image available at {}",
                url
            )));
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Logo download returned status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to read logo bytes: {}", e)))?
            .to_vec();

        if bytes.is_empty() {
            return Err(AppError::ExternalService(format!(
                "Logo download from {} returned an empty body",
                url
            )));
        }

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}
