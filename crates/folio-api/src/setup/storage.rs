//! Storage setup

use crate::constants::FILES_PREFIX;
use anyhow::{Context, Result};
use folio_core::Config;
use folio_storage::{LocalStorage, Storage};
use std::sync::Arc;

/// Setup the local object store. Public URLs are rooted at
/// `{PUBLIC_BASE_URL}/files`.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let base_url = format!(
        "{}{}",
        config.server.public_base_url.trim_end_matches('/'),
        FILES_PREFIX
    );

    let storage = LocalStorage::new(config.storage.local_path.clone(), base_url)
        .await
        .context("Failed to initialize local storage")?;

    tracing::info!(
        path = %config.storage.local_path.display(),
        "Local storage initialized"
    );

    Ok(Arc::new(storage))
}
