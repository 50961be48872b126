//! Upload pipeline models.

use serde::Serialize;
use utoipa::ToSchema;

use super::MediaKind;

/// A file that has been validated and written to the object store. The URL
/// is the only handle downstream consumers get.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredAsset {
    /// Public URL resolving to the stored bytes.
    pub url: String,
    /// Storage key the bytes were written under.
    pub storage_key: String,
    /// Original filename as declared by the client.
    pub file_name: String,
    pub content_type: String,
    /// Size of the stored bytes.
    pub size: usize,
    pub kind: MediaKind,
}
