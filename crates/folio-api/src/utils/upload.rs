//! Common utilities for file upload handlers

use axum::extract::Multipart;
use bytes::Bytes;
use folio_core::AppError;

/// Extract file data, filename, and content type from a multipart form.
/// Only one field named "file" is accepted; multiple file fields are rejected.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
) -> Result<(Vec<u8>, String, String), AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == "file" {
            if file_data.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            filename = field.file_name().map(|s: &str| s.to_string());
            content_type = field.content_type().map(|s: &str| s.to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

            file_data = Some(data.to_vec());
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    let original_filename = filename.unwrap_or_else(|| "unknown".to_string());
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((file_data, original_filename, content_type))
}

/// One decoded chunk-upload form. Field names are part of the client
/// contract: `uploadId`, `chunkIndex`, `totalChunks`, `fileName`,
/// `contentType`, and the binary `file` part.
#[derive(Debug)]
pub struct ChunkForm {
    pub upload_id: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Extract a chunk-upload form. `fileName`/`contentType` fall back to the
/// metadata of the `file` part when the explicit fields are absent.
pub async fn extract_chunk_form(mut multipart: Multipart) -> Result<ChunkForm, AppError> {
    let mut upload_id: Option<String> = None;
    let mut chunk_index: Option<String> = None;
    let mut total_chunks: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "uploadId" => upload_id = Some(read_text_field(field).await?),
            "chunkIndex" => chunk_index = Some(read_text_field(field).await?),
            "totalChunks" => total_chunks = Some(read_text_field(field).await?),
            "fileName" => file_name = Some(read_text_field(field).await?),
            "contentType" => content_type = Some(read_text_field(field).await?),
            "file" => {
                if data.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                if file_name.is_none() {
                    file_name = field.file_name().map(|s: &str| s.to_string());
                }
                if content_type.is_none() {
                    content_type = field.content_type().map(|s: &str| s.to_string());
                }
                data = Some(field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read chunk data: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let upload_id = require_field(upload_id, "uploadId")?;
    if upload_id.trim().is_empty() {
        return Err(AppError::InvalidInput("uploadId must not be empty".to_string()));
    }
    let chunk_index = parse_u32(&require_field(chunk_index, "chunkIndex")?, "chunkIndex")?;
    let total_chunks = parse_u32(&require_field(total_chunks, "totalChunks")?, "totalChunks")?;
    let file_name = require_field(file_name, "fileName")?;
    let content_type = require_field(content_type, "contentType")?;
    let data = data.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(ChunkForm {
        upload_id,
        chunk_index,
        total_chunks,
        file_name,
        content_type,
        data,
    })
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart field: {}", e)))
}

fn require_field(value: Option<String>, name: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::InvalidInput(format!("Missing required field '{}'", name)))
}

fn parse_u32(value: &str, name: &str) -> Result<u32, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Field '{}' must be a non-negative integer", name)))
}
