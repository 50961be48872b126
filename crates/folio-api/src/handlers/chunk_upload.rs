//! Chunked upload handler for large files.
//!
//! The client splits a file into fixed-size chunks and posts them
//! sequentially under a shared upload id. Chunks may be retained in any
//! arrival order; the chunk carrying the last index triggers assembly in
//! strict index order and runs the result through the same persistence path
//! as direct uploads. Only the final chunk's response carries a URL - the
//! client's upload loop depends on that asymmetry.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_chunk_form;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use folio_services::{persist_upload, ChunkOutcome, ChunkUpload};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Response for a chunk upload request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChunkUploadResponse {
    pub success: bool,
    /// Present only on the response to the final chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Upload one chunk of a large file.
#[utoipa::path(
    post,
    path = "/api/v0/uploads/chunks",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Chunk accepted; url present on the final chunk", body = ChunkUploadResponse),
        (status = 400, description = "Invalid input or assembly failure", body = ErrorResponse),
        (status = 410, description = "Upload session expired", body = ErrorResponse),
        (status = 413, description = "Chunk or file too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_chunk"))]
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = extract_chunk_form(multipart).await?;
    let upload_id = form.upload_id.clone();

    let outcome = state
        .uploads
        .chunk_store
        .put_chunk(ChunkUpload {
            upload_id: form.upload_id,
            chunk_index: form.chunk_index,
            total_chunks: form.total_chunks,
            file_name: form.file_name,
            content_type: form.content_type,
            data: form.data,
        })
        .await?;

    match outcome {
        ChunkOutcome::Buffered { received, total } => {
            tracing::debug!(
                upload_id = %upload_id,
                received,
                total,
                "Chunk retained"
            );
            Ok(Json(ChunkUploadResponse {
                success: true,
                url: None,
            }))
        }
        ChunkOutcome::Complete(assembled) => {
            let result = persist_upload(
                state.media.storage.as_ref(),
                &state.media.limits,
                &assembled.file_name,
                &assembled.content_type,
                assembled.data,
            )
            .await;

            let asset = match result {
                Ok(asset) => asset,
                Err(err) => {
                    // Persistence failed after the store closed the session;
                    // the upload id must not read as completed.
                    state.uploads.chunk_store.mark_failed(&upload_id).await;
                    return Err(err.into());
                }
            };

            tracing::info!(
                upload_id = %upload_id,
                url = %asset.url,
                size = asset.size,
                "Chunked upload completed"
            );

            Ok(Json(ChunkUploadResponse {
                success: true,
                url: Some(asset.url),
            }))
        }
    }
}
