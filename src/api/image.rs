//! Profile image endpoints
//!
//! Profile images are keyed by login: the stored file is `{LoginID}{ext}`.
//! Uploads land under a temporary name first and are renamed once the form
//! validates, so a rejected request never leaves a keyed file behind.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::state::AppState;
use crate::uploads::{MAX_UPLOAD_BYTES, StoredUpload, extension_of};

use super::ApiResult;

const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".webp", ".gif"];

/// Reject identifiers that could escape the upload directory.
fn validate_login_id(login_id: &str) -> Result<(), AppError> {
    if login_id.is_empty()
        || login_id.contains('/')
        || login_id.contains('\\')
        || login_id.contains("..")
    {
        return Err(AppError::validation("Invalid login ID"));
    }
    Ok(())
}

pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut login_id: Option<String> = None;
    let mut temp: Option<(StoredUpload, String, usize)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if content_type != "image/png" {
                    return Err(AppError::validation("Only PNG files are allowed!"));
                }
                let original_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::validation("File too large. Maximum size is 5MB."));
                }
                let size = data.len();
                let stored = state.uploads.store_temp_image(&original_name, &data).await?;
                temp = Some((stored, original_name, size));
            }
            "LoginID" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
                login_id = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    let Some((stored, original_name, size)) = temp else {
        return Err(AppError::validation("No file uploaded or invalid file type"));
    };

    let Some(login_id) = login_id else {
        state.uploads.discard(&stored).await;
        return Err(AppError::validation("LoginID is required"));
    };
    if let Err(e) = validate_login_id(&login_id) {
        state.uploads.discard(&stored).await;
        return Err(e);
    }

    let file_name = format!("{login_id}{}", extension_of(&original_name));
    let stored = state.uploads.rename(&stored, &file_name).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Image uploaded successfully",
            "data": {
                "filename": stored.file_name,
                "originalName": original_name,
                "size": size,
                "url": format!("/uploads/{}", stored.file_name),
                "loginID": login_id,
            }
        })),
    ))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(login_id): Path<String>,
) -> Result<Response, AppError> {
    validate_login_id(&login_id)?;

    for ext in IMAGE_EXTENSIONS {
        let file_name = format!("{login_id}{ext}");
        let path = state.uploads.path_of(&file_name);
        let Ok(bytes) = tokio::fs::read(&path).await else {
            continue;
        };
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();
        return Ok((
            [
                (header::CONTENT_TYPE, content_type),
                (
                    header::CACHE_CONTROL,
                    "no-cache, no-store, must-revalidate".to_string(),
                ),
                (header::PRAGMA, "no-cache".to_string()),
                (header::EXPIRES, "0".to_string()),
            ],
            bytes,
        )
            .into_response());
    }

    Err(AppError::not_found("Image not found"))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path(login_id): Path<String>,
) -> ApiResult<Value> {
    validate_login_id(&login_id)?;

    let path = state.uploads.path_of(&format!("{login_id}.png"));
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(Json(json!({
            "success": true,
            "message": "Image deleted successfully"
        }))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::not_found("Image not found"))
        }
        Err(e) => Err(AppError::internal(format!("Failed to delete image: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_id_traversal_guard() {
        assert!(validate_login_id("31").is_ok());
        assert!(validate_login_id("shop_a").is_ok());
        assert!(validate_login_id("").is_err());
        assert!(validate_login_id("../etc/passwd").is_err());
        assert!(validate_login_id("a/b").is_err());
        assert!(validate_login_id("a\\b").is_err());
    }
}
