//! Shared upload persistence pipeline.
//!
//! Both the direct upload handler and the chunked-upload assembler run files
//! through `persist_upload`, so an assembled file is indistinguishable from a
//! directly uploaded one to downstream consumers.

use folio_core::constants::MEDIA_KEY_PREFIX;
use folio_core::models::StoredAsset;
use folio_core::{AppError, UploadLimits};
use folio_storage::Storage;
use uuid::Uuid;

/// Validate and persist one upload, returning the stored asset metadata.
pub async fn persist_upload(
    storage: &dyn Storage,
    limits: &UploadLimits,
    file_name: &str,
    content_type: &str,
    data: Vec<u8>,
) -> Result<StoredAsset, AppError> {
    if data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }

    let kind = limits.resolve_kind(content_type).ok_or_else(|| {
        AppError::InvalidInput(format!("Unsupported content type: {}", content_type))
    })?;
    let kind_limits = limits.limits_for(kind);

    if data.len() > kind_limits.max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            kind_limits.max_file_size / 1024 / 1024
        )));
    }

    let safe_file_name = sanitize_filename(file_name)?;
    let extension = validate_file_extension(&safe_file_name, &kind_limits.allowed_extensions)?;

    let file_uuid = Uuid::new_v4();
    let storage_key = format!("{}/{}.{}", MEDIA_KEY_PREFIX, file_uuid, extension);
    let size = data.len();

    let url = storage
        .upload_with_key(&storage_key, data, content_type)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to upload file: {}", e)))?;

    tracing::info!(
        file_uuid = %file_uuid,
        original_filename = %safe_file_name,
        file_size = size,
        kind = %kind,
        "Upload persisted"
    );

    Ok(StoredAsset {
        url,
        storage_key,
        file_name: safe_file_name,
        content_type: content_type.to_string(),
        size,
        kind,
    })
}

/// Validate file extension against the kind's allowlist; returns the
/// lowercased extension.
pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    if !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file extension. Allowed extensions: {}",
            allowed_extensions.join(", ")
        )));
    }

    Ok(extension)
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    const MAX_FILENAME_LENGTH: usize = 255;

    if filename.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() || sanitized.len() < 3 {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_storage::LocalStorage;
    use tempfile::tempdir;

    fn test_limits() -> UploadLimits {
        UploadLimits {
            image_max_bytes: 1024,
            image_allowed_extensions: vec!["png".into(), "jpg".into()],
            image_allowed_content_types: vec!["image/png".into(), "image/jpeg".into()],
            pdf_max_bytes: 2048,
            pdf_allowed_extensions: vec!["pdf".into()],
            pdf_allowed_content_types: vec!["application/pdf".into()],
            document_max_bytes: 2048,
            document_allowed_extensions: vec!["docx".into()],
            document_allowed_content_types: vec![
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
            ],
            chunk_size_bytes: 512,
            max_chunk_bytes: 1024,
            max_chunk_count: 16,
            session_ttl_secs: 1800,
            session_reap_interval_secs: 60,
        }
    }

    #[tokio::test]
    async fn persists_valid_upload_and_bytes_round_trip() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/files".to_string())
            .await
            .unwrap();

        let data = b"png bytes".to_vec();
        let asset = persist_upload(&storage, &test_limits(), "logo.png", "image/png", data.clone())
            .await
            .unwrap();

        assert!(asset.storage_key.starts_with("media/"));
        assert!(asset.storage_key.ends_with(".png"));
        assert!(asset.url.ends_with(&asset.storage_key));
        assert_eq!(asset.size, data.len());

        let stored = storage.download(&asset.storage_key).await.unwrap();
        assert_eq!(stored, data);
    }

    #[tokio::test]
    async fn rejects_empty_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/files".to_string())
            .await
            .unwrap();

        let err = persist_upload(&storage, &test_limits(), "logo.png", "image/png", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_unsupported_content_type() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/files".to_string())
            .await
            .unwrap();

        let err = persist_upload(
            &storage,
            &test_limits(),
            "tool.exe",
            "application/x-msdownload",
            b"MZ".to_vec(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_extension_not_matching_kind() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/files".to_string())
            .await
            .unwrap();

        let err = persist_upload(
            &storage,
            &test_limits(),
            "payload.bin",
            "image/png",
            b"data".to_vec(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:4000/files".to_string())
            .await
            .unwrap();

        let err = persist_upload(
            &storage,
            &test_limits(),
            "big.png",
            "image/png",
            vec![0u8; 2048],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn sanitize_filename_rejects_path_traversal() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("foo/../bar").is_err());
        assert!(sanitize_filename("....").is_err());
    }

    #[test]
    fn sanitize_filename_accepts_valid_names() {
        assert_eq!(sanitize_filename("image.png").unwrap(), "image.png");
        assert_eq!(sanitize_filename("my-file_1.jpg").unwrap(), "my-file_1.jpg");
    }
}
