use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use uuid::Uuid;

use crate::{
    entities::image::{ImageListEntry, UploadedImage},
    errors::AppError,
    repositories::fs_repo::FsImageStore,
    utils::image_files::{extension_of, is_allowed_extension, is_image_content_type},
};

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Validates and writes a new upload under a fresh identifier.
    async fn save(
        &self,
        data: &[u8],
        content_type: Option<&str>,
        original_filename: Option<&str>,
    ) -> Result<UploadedImage, AppError>;
    async fn locate(&self, image_id: &str) -> Result<PathBuf, AppError>;
    async fn list(&self) -> Result<Vec<ImageListEntry>, AppError>;
    async fn remove(&self, path: &Path) -> Result<(), AppError>;
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsImageStore { root: root.into() }
    }

    /// Creates the storage directory if it does not exist yet.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root).await.map_err(|e| {
            AppError::InternalError(format!(
                "Cannot create upload directory {}: {}",
                store.root.display(),
                e
            ))
        })?;
        Ok(store)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(
        &self,
        data: &[u8],
        content_type: Option<&str>,
        original_filename: Option<&str>,
    ) -> Result<UploadedImage, AppError> {
        if !is_image_content_type(content_type) {
            return Err(AppError::InvalidInput("File must be an image".to_string()));
        }

        let original_filename = original_filename.unwrap_or_default().to_string();
        let extension = extension_of(&original_filename)
            .filter(|ext| is_allowed_extension(ext))
            .ok_or_else(|| AppError::InvalidInput("Unsupported image format".to_string()))?;

        let image_id = Uuid::new_v4().to_string();
        let saved_filename = format!("{}.{}", image_id, extension);
        let file_path = self.root.join(&saved_filename);

        let written = async {
            fs::create_dir_all(&self.root).await?;
            fs::write(&file_path, data).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&file_path).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %file_path.display(), "Failed to remove partial upload: {}", cleanup);
                }
            }
            return Err(AppError::InternalError(format!("Error saving image: {}", e)));
        }

        tracing::info!(%image_id, bytes = data.len(), "Stored upload {}", saved_filename);

        Ok(UploadedImage {
            image_id,
            original_filename,
            saved_filename,
            file_path,
            created_at: Utc::now(),
        })
    }

    /// Scans the directory for a file whose stem equals `image_id`.
    /// Cost grows with the number of stored images.
    async fn locate(&self, image_id: &str) -> Result<PathBuf, AppError> {
        let not_found = || AppError::NotFound("Image not found".to_string());

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let stem_matches = path
                .file_stem()
                .map(|stem| stem.to_string_lossy() == image_id)
                .unwrap_or(false);
            if stem_matches && entry.file_type().await?.is_file() {
                matches.push(path);
            }
        }

        matches.sort();
        matches.into_iter().next().ok_or_else(not_found)
    }

    async fn list(&self) -> Result<Vec<ImageListEntry>, AppError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            // A file removed after the directory read (e.g. a failed upload being
            // cleaned up) is simply no longer part of the listing.
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            let path = entry.path();
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            images.push(ImageListEntry {
                image_id: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                filename: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                created,
            });
        }

        images.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.filename.cmp(&b.filename)));
        Ok(images)
    }

    async fn remove(&self, path: &Path) -> Result<(), AppError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::InternalError(format!("Error removing image: {}", e))),
        }
    }
}
