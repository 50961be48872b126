//! Direct (single-request) upload handler.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use folio_core::models::StoredAsset;
use folio_services::persist_upload;
use std::sync::Arc;

/// Upload a single file inline. Files above the inline threshold should use
/// the chunked upload endpoint instead.
#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = StoredAsset),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (file_data, original_filename, content_type) = extract_multipart_file(multipart).await?;

    tracing::info!(
        filename = %original_filename,
        content_type = %content_type,
        file_size = file_data.len(),
        "Processing direct upload"
    );

    let asset = persist_upload(
        state.media.storage.as_ref(),
        &state.media.limits,
        &original_filename,
        &content_type,
        file_data,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}
