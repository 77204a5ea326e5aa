//! Image Upload Handler
//!
//! Accepts PNG, JPEG, WebP and GIF. Files are named by the SHA-256 of their
//! content, so uploading the same image twice yields the same URL.

use std::path::Path;

use axum::extract::{Multipart, State};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::products;
use crate::utils::{AppError, ErrorCode};

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Public URL prefix for stored files
const URL_PREFIX: &str = "/uploads/";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
}

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Lowercased extension, normalized so `jpeg` and `jpg` share one name
fn normalized_extension(filename: &str) -> Result<String, AppError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!("Invalid file extension for: {filename}"),
            )
        })?;
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!(
                "Unsupported file format '{ext}'. Supported: {}",
                SUPPORTED_FORMATS.join(", ")
            ),
        ));
    }
    Ok(if ext == "jpeg" { "jpg".to_string() } else { ext })
}

fn validate_image(data: &[u8], max_bytes: usize) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > max_bytes {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large. Maximum size is {max_bytes} bytes"),
        )
        .with_detail("max_bytes", max_bytes));
    }
    image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image file: {e}"))
    })?;
    Ok(())
}

/// Stored filename for a public `/uploads/<name>` URL, if it is one of ours
fn stored_name(url: &str) -> Option<&str> {
    url.strip_prefix(URL_PREFIX)
        .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && !name.contains(".."))
}

/// POST /api/upload - multipart field `file`
pub async fn upload(
    State(state): State<ServerState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart request: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?;
            file = Some((filename, data.to_vec()));
            break;
        }
    }

    let (original_name, data) = file.ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;
    let ext = normalized_extension(&original_name)?;
    validate_image(&data, state.config.max_upload_bytes)?;

    let filename = format!("{}.{ext}", calculate_hash(&data));
    let path = state.upload_dir().join(&filename);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::info!(original_name = %original_name, file = %filename, "Duplicate image, reusing stored file");
    } else {
        tokio::fs::create_dir_all(state.upload_dir())
            .await
            .map_err(|e| AppError::with_message(ErrorCode::FileStorageFailed, e.to_string()))?;
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::with_message(ErrorCode::FileStorageFailed, e.to_string()))?;
        tracing::info!(
            user_id = user.id,
            original_name = %original_name,
            file = %filename,
            size = data.len(),
            "Image uploaded"
        );
    }

    ok(UploadResponse {
        url: format!("{URL_PREFIX}{filename}"),
        filename,
        size: data.len(),
    })
}

/// Delete a stored upload once nothing references it any more.
///
/// Failures are logged, never returned: the owning record is already gone.
pub(crate) async fn remove_unreferenced(state: &ServerState, url: &str) {
    let Some(name) = stored_name(url) else {
        return;
    };
    match products::image_in_use(&state.pool, url).await {
        Ok(true) => {}
        Ok(false) => {
            if let Err(e) = tokio::fs::remove_file(state.upload_dir().join(name)).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(file = %name, error = %e, "Failed to remove uploaded file");
            }
        }
        Err(e) => tracing::warn!(file = %name, error = ?e, "Could not check image references"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_extension() {
        assert_eq!(normalized_extension("photo.JPEG").unwrap(), "jpg");
        assert_eq!(normalized_extension("a.b.png").unwrap(), "png");
        assert_eq!(normalized_extension("anim.gif").unwrap(), "gif");
        assert_eq!(
            normalized_extension("doc.pdf").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert!(normalized_extension("noext").is_err());
    }

    #[test]
    fn test_validate_image_rejects_bad_input() {
        assert_eq!(validate_image(&[], 10).unwrap_err().code, ErrorCode::EmptyFile);
        assert_eq!(
            validate_image(&[0u8; 32], 8).unwrap_err().code,
            ErrorCode::FileTooLarge
        );
        assert_eq!(
            validate_image(b"not an image", 1024).unwrap_err().code,
            ErrorCode::InvalidImageFile
        );
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let h = calculate_hash(b"abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, calculate_hash(b"abc"));
        assert_ne!(h, calculate_hash(b"abd"));
    }

    #[test]
    fn test_stored_name() {
        assert_eq!(stored_name("/uploads/abc.png"), Some("abc.png"));
        assert_eq!(stored_name("/uploads/../etc/passwd"), None);
        assert_eq!(stored_name("/uploads/"), None);
        assert_eq!(stored_name("https://cdn.example.com/x.png"), None);
    }
}
