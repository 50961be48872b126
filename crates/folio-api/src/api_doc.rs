//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::chunk_upload::ChunkUploadResponse;
use crate::handlers::health::HealthResponse;
use crate::handlers::logos::LogoResolveResponse;
use folio_core::models::{LogoSource, MediaKind, StoredAsset};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health,
        crate::handlers::upload::upload_file,
        crate::handlers::chunk_upload::upload_chunk,
        crate::handlers::logos::resolve_logo,
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        ChunkUploadResponse,
        LogoResolveResponse,
        StoredAsset,
        MediaKind,
        LogoSource,
    )),
    tags(
        (name = "uploads", description = "Direct and chunked file uploads"),
        (name = "logos", description = "Logo resolution cache"),
        (name = "service", description = "Service endpoints")
    )
)]
pub struct ApiDoc;
