//! Upload coordination
//!
//! `UploadStore` owns the shared image directory and the lifecycle rules
//! around it: which asset name a catalog write persists, when a replaced
//! asset may be deleted, and how an upload orphaned by a failed write is
//! reclaimed. Deletions are compensating actions — they run only after the
//! transaction outcome is final and their errors are logged, never
//! propagated.
//!
//! Naming conventions are load-bearing (retrieval endpoints look files up
//! by them): catalog images are `{epoch_millis}{ext}`, profile images are
//! `{LoginID}.png`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;

use crate::error::AppError;

/// Asset guaranteed present in every deployment; never deleted.
pub const FALLBACK_IMAGE: &str = "no-image-icon-4.png";

/// Maximum accepted upload size (5MB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A file written to the upload directory during request parsing
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub file_name: String,
    pub path: PathBuf,
}

/// Outcome of resolving the asset reference for an update
#[derive(Debug, Clone, PartialEq)]
pub struct AssetResolution {
    /// Reference to persist
    pub image_name: String,
    /// Reference the entry held before the update
    pub previous: String,
    /// Whether the reference changes with this update
    pub changing: bool,
}

/// Shared image directory plus the lifecycle rules around it
#[derive(Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Asset reference for a create: uploaded file, then the caller-chosen
    /// default, then the fallback constant.
    pub fn resolve_create(
        &self,
        upload: Option<&StoredUpload>,
        use_default: bool,
        default_name: Option<&str>,
    ) -> String {
        if let Some(upload) = upload {
            return upload.file_name.clone();
        }
        if use_default {
            if let Some(name) = default_name.filter(|n| !n.is_empty()) {
                return name.to_string();
            }
        }
        FALLBACK_IMAGE.to_string()
    }

    /// Asset reference for an update, mirroring the create resolution but
    /// against the existing reference, and reporting whether it changes.
    pub fn resolve_update(
        &self,
        existing: &str,
        upload: Option<&StoredUpload>,
        use_default: bool,
        default_name: Option<&str>,
    ) -> AssetResolution {
        if let Some(upload) = upload {
            return AssetResolution {
                image_name: upload.file_name.clone(),
                previous: existing.to_string(),
                changing: true,
            };
        }
        if use_default {
            let name = default_name.filter(|n| !n.is_empty()).unwrap_or(FALLBACK_IMAGE);
            return AssetResolution {
                image_name: name.to_string(),
                previous: existing.to_string(),
                changing: name != existing,
            };
        }
        AssetResolution {
            image_name: existing.to_string(),
            previous: existing.to_string(),
            changing: false,
        }
    }

    /// Post-commit cleanup: delete the replaced asset. Must only be called
    /// after the transaction committed. The fallback asset is never deleted.
    pub async fn remove_replaced(&self, resolution: &AssetResolution) {
        if !resolution.changing
            || resolution.previous.is_empty()
            || resolution.previous == resolution.image_name
            || resolution.previous == FALLBACK_IMAGE
        {
            return;
        }
        let path = self.path_of(&resolution.previous);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(image = %resolution.previous, error = %e, "Failed to remove replaced image");
        } else {
            tracing::info!(image = %resolution.previous, "Removed replaced image");
        }
    }

    /// Rollback compensation: delete a freshly uploaded file so a failed
    /// write leaves no orphan behind.
    pub async fn discard(&self, upload: &StoredUpload) {
        if let Err(e) = tokio::fs::remove_file(&upload.path).await {
            tracing::warn!(image = %upload.file_name, error = %e, "Failed to remove orphaned upload");
        } else {
            tracing::info!(image = %upload.file_name, "Removed orphaned upload");
        }
    }

    /// Write a catalog image under a timestamp-derived unique name.
    pub async fn store_catalog_image(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredUpload, AppError> {
        let file_name = format!(
            "{}{}",
            chrono::Utc::now().timestamp_millis(),
            extension_of(original_name)
        );
        self.write(file_name, data).await
    }

    /// Write a profile image under a temporary name; renamed to
    /// `{LoginID}{ext}` once the form is validated.
    pub async fn store_temp_image(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredUpload, AppError> {
        let file_name = format!(
            "temp_{}_{}",
            chrono::Utc::now().timestamp_millis(),
            original_name
        );
        self.write(file_name, data).await
    }

    /// Rename a stored upload to its final convention-derived name.
    pub async fn rename(
        &self,
        upload: &StoredUpload,
        new_name: &str,
    ) -> Result<StoredUpload, AppError> {
        let path = self.path_of(new_name);
        tokio::fs::rename(&upload.path, &path)
            .await
            .map_err(|e| AppError::internal(format!("Failed to store image: {e}")))?;
        Ok(StoredUpload {
            file_name: new_name.to_string(),
            path,
        })
    }

    async fn write(&self, file_name: String, data: &[u8]) -> Result<StoredUpload, AppError> {
        let path = self.path_of(&file_name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::internal(format!("Failed to store image: {e}")))?;
        Ok(StoredUpload { file_name, path })
    }
}

/// Lowercased extension including the dot, or empty.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// A parsed multipart product form: text fields plus the optional `image`
/// file, which is already on disk by the time parsing returns.
pub struct ProductForm {
    fields: HashMap<String, String>,
    pub upload: Option<StoredUpload>,
}

impl ProductForm {
    /// Trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Checkbox-style flag sent as the string `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.text(name) == Some("true")
    }
}

/// Read a multipart product form, storing the `image` field (if any) into
/// the upload directory as part of parsing.
pub async fn read_product_form(
    store: &UploadStore,
    mut multipart: Multipart,
) -> Result<ProductForm, AppError> {
    let mut fields = HashMap::new();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let original_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
            if data.is_empty() {
                continue;
            }
            if data.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::validation(
                    "File too large. Maximum size is 5MB.",
                ));
            }
            upload = Some(store.store_catalog_image(&original_name, &data).await?);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok(ProductForm { fields, upload })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_at(dir: &Path) -> UploadStore {
        UploadStore::new(dir)
    }

    fn upload(name: &str, dir: &Path) -> StoredUpload {
        StoredUpload {
            file_name: name.to_string(),
            path: dir.join(name),
        }
    }

    #[test]
    fn test_create_resolution_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        let uploaded = upload("1710000000000.png", dir.path());

        // Uploaded file beats the default flag
        assert_eq!(
            store.resolve_create(Some(&uploaded), true, Some("default.png")),
            "1710000000000.png"
        );
        // Default flag with a name beats the fallback
        assert_eq!(
            store.resolve_create(None, true, Some("default.png")),
            "default.png"
        );
        // Flag without a name still falls back
        assert_eq!(store.resolve_create(None, true, None), FALLBACK_IMAGE);
        // Nothing at all falls back
        assert_eq!(store.resolve_create(None, false, None), FALLBACK_IMAGE);
    }

    #[test]
    fn test_update_resolution_detects_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        let uploaded = upload("1710000000001.png", dir.path());

        let res = store.resolve_update("old.png", Some(&uploaded), false, None);
        assert!(res.changing);
        assert_eq!(res.image_name, "1710000000001.png");
        assert_eq!(res.previous, "old.png");

        let res = store.resolve_update("old.png", None, true, Some("default.png"));
        assert!(res.changing);
        assert_eq!(res.image_name, "default.png");

        // Default flag resolving to the current reference is not a change
        let res = store.resolve_update("default.png", None, true, Some("default.png"));
        assert!(!res.changing);

        // No file and no flag leaves the reference untouched
        let res = store.resolve_update("old.png", None, false, None);
        assert!(!res.changing);
        assert_eq!(res.image_name, "old.png");
    }

    #[tokio::test]
    async fn test_remove_replaced_deletes_old_asset() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        std::fs::write(dir.path().join("old.png"), b"old").unwrap();

        let res = AssetResolution {
            image_name: "new.png".into(),
            previous: "old.png".into(),
            changing: true,
        };
        store.remove_replaced(&res).await;
        assert!(!dir.path().join("old.png").exists());
    }

    #[tokio::test]
    async fn test_remove_replaced_never_deletes_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        std::fs::write(dir.path().join(FALLBACK_IMAGE), b"fallback").unwrap();

        let res = AssetResolution {
            image_name: "new.png".into(),
            previous: FALLBACK_IMAGE.into(),
            changing: true,
        };
        store.remove_replaced(&res).await;
        assert!(dir.path().join(FALLBACK_IMAGE).exists());
    }

    #[tokio::test]
    async fn test_unchanged_update_keeps_existing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        std::fs::write(dir.path().join("keep.png"), b"keep").unwrap();

        let res = store.resolve_update("keep.png", None, false, None);
        store.remove_replaced(&res).await;
        assert!(dir.path().join("keep.png").exists());
    }

    #[tokio::test]
    async fn test_discard_removes_orphaned_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        let stored = store
            .store_catalog_image("photo.PNG", b"data")
            .await
            .unwrap();
        assert!(stored.file_name.ends_with(".png"));
        assert!(stored.path.exists());

        store.discard(&stored).await;
        assert!(!stored.path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_previous_asset_in_place() {
        // Simulates the rollback path of an update: the new upload is
        // discarded, the previously stored asset is never touched.
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        std::fs::write(dir.path().join("old.png"), b"old").unwrap();
        let stored = store.store_catalog_image("new.png", b"new").await.unwrap();

        store.discard(&stored).await;
        assert!(dir.path().join("old.png").exists());
        assert!(!stored.path.exists());
    }

    #[tokio::test]
    async fn test_profile_rename_follows_login_convention() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path());
        let temp = store.store_temp_image("me.png", b"img").await.unwrap();
        assert!(temp.file_name.starts_with("temp_"));

        let final_upload = store.rename(&temp, "31.png").await.unwrap();
        assert_eq!(final_upload.file_name, "31.png");
        assert!(dir.path().join("31.png").exists());
        assert!(!temp.path.exists());
    }
}
