//! Asset delivery: streams stored bytes back over the public URL space.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use folio_core::models::mime_for_extension;
use folio_core::AppError;
use futures::StreamExt;
use std::sync::Arc;

/// Serve a stored asset by its storage key. The key space is the one the
/// upload pipeline and logo materializer write into (`media/...`,
/// `logos/...`); traversal-unsafe keys are rejected by the storage layer.
#[tracing::instrument(skip(state), fields(operation = "get_asset"))]
pub async fn get_asset(
    Path(storage_key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let stream = state
        .media
        .storage
        .download_stream(&storage_key)
        .await
        .map_err(HttpAppError::from)?;

    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let extension = storage_key.rsplit('.').next().unwrap_or("");
    let content_type = mime_for_extension(extension);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
