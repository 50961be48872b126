//! Name -> logo URL resolution.

use std::sync::Arc;

use folio_core::constants::LOGO_KEY_PREFIX;
use folio_core::models::{mime_for_extension, LogoResolution, LogoSource};
use folio_core::AppError;
use folio_db::LogoCacheRepository;
use folio_storage::Storage;

use super::fetcher::LogoFetcher;
use super::naming::{extension_from_url, short_suffix, slugify};
use super::providers::LogoProvider;

/// Resolves organization/technology names to cached logo URLs.
///
/// Providers are tried in preference order. Concurrent misses for the same
/// name are not deduplicated: both requests may resolve and upsert, last
/// write wins, and either outcome is a valid logo for that name.
pub struct LogoResolver {
    repository: LogoCacheRepository,
    storage: Arc<dyn Storage>,
    providers: Vec<Arc<dyn LogoProvider>>,
    fetcher: Arc<dyn LogoFetcher>,
}

impl LogoResolver {
    pub fn new(
        repository: LogoCacheRepository,
        storage: Arc<dyn Storage>,
        providers: Vec<Arc<dyn LogoProvider>>,
        fetcher: Arc<dyn LogoFetcher>,
    ) -> Self {
        Self {
            repository,
            storage,
            providers,
            fetcher,
        }
    }

    /// Resolve a name to a logo URL: cache first, external resolution and
    /// materialization on a miss. The cache row is written only after the
    /// image file write succeeds, so every cache entry has a backing file.
    pub async fn resolve(&self, name: &str) -> Result<LogoResolution, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Organization name must not be empty".to_string(),
            ));
        }

        if let Some(entry) = self.repository.get(name).await? {
            let url = self
                .storage
                .public_url(&entry.storage_key)
                .map_err(|e| AppError::Storage(e.to_string()))?;
            tracing::debug!(name, storage_key = %entry.storage_key, "Logo cache hit");
            return Ok(LogoResolution {
                url,
                cached: true,
                source: entry.source,
            });
        }

        let (image_url, source) = self.find_candidate(name).await?;
        let fetched = self.fetcher.fetch(&image_url).await?;

        let extension = extension_from_url(&image_url);
        let file_name = format!("{}-{}.{}", slugify(name), short_suffix(), extension);
        let storage_key = format!("{}/{}", LOGO_KEY_PREFIX, file_name);
        let content_type = fetched
            .content_type
            .clone()
            .unwrap_or_else(|| mime_for_extension(&extension).to_string());

        let url = self
            .storage
            .upload_with_key(&storage_key, fetched.bytes, &content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to persist logo: {}", e)))?;

        self.repository.upsert(name, &storage_key, source).await?;

        tracing::info!(
            name,
            source = %source,
            storage_key = %storage_key,
            source_url = %image_url,
            "Logo resolved and cached"
        );

        Ok(LogoResolution {
            url,
            cached: false,
            source,
        })
    }

    async fn find_candidate(&self, name: &str) -> Result<(String, LogoSource), AppError> {
        for provider in &self.providers {
            match provider.find_logo_url(name).await {
                Ok(Some(url)) => return Ok((url, provider.source())),
                Ok(None) => {
                    tracing::debug!(name, provider = %provider.source(), "Provider returned no candidate");
                }
                Err(e) => {
                    tracing::warn!(name, provider = %provider.source(), error = %e, "Provider lookup failed");
                }
            }
        }
        Err(AppError::NotFound(format!("No logo found for '{}'", name)))
    }
}
