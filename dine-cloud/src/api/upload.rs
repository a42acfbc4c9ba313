//! Image upload for menu items and restaurant logos
//!
//! POST /api/upload: multipart → validate → JPEG compress → SHA256 → disk
//!
//! Images are stored at `{upload_dir}/{restaurant_id}/{hash}.jpg` and served
//! under `/uploads/`. The same picture uploaded twice maps to the same file.

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};
use std::io::Cursor;
use std::path::Path;

use crate::auth::SessionIdentity;
use crate::state::AppState;

/// Maximum file size (10MB)
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

const JPEG_QUALITY: u8 = 85;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload_image))
        // Multipart framing on top of the file itself
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn check_upload(data: &[u8], filename: &str) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::new(ErrorCode::FileTooLarge)
            .with_detail("size", data.len())
            .with_detail("max", MAX_FILE_SIZE));
    }
    let ext = extension_of(filename);
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!("Unsupported format: {ext}. Supported: png, jpg, jpeg, webp"),
        ));
    }
    Ok(())
}

/// Decode, re-encode as JPEG and hash. Returns `(sha256 hex, jpeg bytes)`.
fn compress_image(data: &[u8]) -> Result<(String, Vec<u8>), AppError> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image: {e}"))
    })?;

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
        tracing::error!(error = %e, "JPEG encoding failed");
        AppError::new(ErrorCode::ImageProcessingFailed)
    })?;

    let hash = hex::encode(Sha256::digest(&buffer));
    Ok((hash, buffer))
}

/// Write the image under the restaurant's directory, returns its public URL
async fn store_image(
    upload_dir: &Path,
    restaurant_id: i64,
    hash: &str,
    jpeg: &[u8],
) -> Result<String, AppError> {
    let dir = upload_dir.join(restaurant_id.to_string());
    let storage_error = |e: std::io::Error| {
        tracing::error!(restaurant_id, hash, error = %e, "Failed to store image");
        AppError::new(ErrorCode::FileStorageFailed)
    };

    tokio::fs::create_dir_all(&dir).await.map_err(storage_error)?;
    let path = dir.join(format!("{hash}.jpg"));
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tokio::fs::write(&path, jpeg).await.map_err(storage_error)?;
    }
    Ok(format!("/uploads/{restaurant_id}/{hash}.jpg"))
}

/// POST /api/upload
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}"))
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| {
                AppError::with_message(ErrorCode::InvalidRequest, format!("Read error: {e}"))
            })?;
            file = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, data) = file.ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;
    check_upload(&data, &filename)?;

    let (hash, jpeg) = tokio::task::spawn_blocking(move || compress_image(&data))
        .await
        .map_err(|e| AppError::internal(format!("Image task failed: {e}")))??;

    let url = store_image(&state.upload_dir, identity.restaurant_id, &hash, &jpeg).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, hash = %hash, "Image uploaded");

    Ok(Json(UploadResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn rejects_bad_uploads() {
        assert_eq!(check_upload(&[], "a.png").unwrap_err().code, ErrorCode::EmptyFile);
        assert_eq!(
            check_upload(&[1, 2, 3], "a.gif").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            check_upload(&vec![0; MAX_FILE_SIZE + 1], "a.png").unwrap_err().code,
            ErrorCode::FileTooLarge
        );
        assert!(check_upload(&[1], "Photo.JPG").is_ok());
    }

    #[test]
    fn garbage_is_not_an_image() {
        let err = compress_image(b"definitely not a png").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidImageFile);
    }

    #[test]
    fn same_picture_same_hash() {
        let (a, jpeg) = compress_image(&png_bytes()).unwrap();
        let (b, _) = compress_image(&png_bytes()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        // JPEG SOI marker
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn stores_under_restaurant_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (hash, jpeg) = compress_image(&png_bytes()).unwrap();

        let url = store_image(dir.path(), 7, &hash, &jpeg).await.unwrap();
        assert_eq!(url, format!("/uploads/7/{hash}.jpg"));
        let stored = std::fs::read(dir.path().join("7").join(format!("{hash}.jpg"))).unwrap();
        assert_eq!(stored, jpeg);

        // Second upload of the same content is a no-op
        let again = store_image(dir.path(), 7, &hash, &jpeg).await.unwrap();
        assert_eq!(again, url);
    }
}
