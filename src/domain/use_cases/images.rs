use std::path::Path;

use chrono::Utc;
use tokio::fs;

use crate::{
    captioning::generator::CaptionGenerator,
    entities::image::{
        AnalysisResponse, ImageListResponse, ImageMetadata, MetadataResponse, StoredImageFile,
        UploadResponse, UploadedImage,
    },
    errors::AppError,
    metadata::extract_metadata,
    repositories::image_store::ImageStore,
    utils::image_files::content_type_for,
};

pub struct ImageAnalysisHandler<S>
where
    S: ImageStore,
{
    pub image_store: S,
    pub captioner: CaptionGenerator,
}

impl<S> ImageAnalysisHandler<S>
where
    S: ImageStore,
{
    pub fn new(image_store: S, captioner: CaptionGenerator) -> Self {
        ImageAnalysisHandler { image_store, captioner }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.captioner.is_model_loaded()
    }

    /// Stores an upload, then describes it. Anything failing after the
    /// write removes the file again so no unreachable upload is left behind.
    pub async fn upload_image(
        &self,
        data: &[u8],
        content_type: Option<&str>,
        original_filename: Option<&str>,
    ) -> Result<UploadResponse, AppError> {
        let uploaded = self
            .image_store
            .save(data, content_type, original_filename)
            .await?;

        match self.describe_upload(&uploaded).await {
            Ok(response) => Ok(response),
            Err(e) => {
                if let Err(cleanup) = self.image_store.remove(&uploaded.file_path).await {
                    tracing::warn!(image_id = %uploaded.image_id, "Cleanup after failed upload did not complete: {}", cleanup);
                }
                Err(AppError::InternalError(format!("Error processing image: {}", e)))
            }
        }
    }

    async fn describe_upload(&self, uploaded: &UploadedImage) -> Result<UploadResponse, AppError> {
        let metadata = extract_metadata(uploaded.file_path.clone()).await?;
        let caption = self.captioner.describe(&uploaded.file_path).await;

        Ok(UploadResponse {
            image_id: uploaded.image_id.clone(),
            original_filename: uploaded.original_filename.clone(),
            saved_filename: uploaded.saved_filename.clone(),
            file_path: uploaded.file_path.display().to_string(),
            description: caption.into_text(),
            metadata,
            upload_time: uploaded.created_at,
        })
    }

    /// Recomputes caption and metadata for a stored image.
    pub async fn analyze_image(&self, image_id: &str) -> Result<AnalysisResponse, AppError> {
        let path = self.image_store.locate(image_id).await?;

        let caption = self.captioner.describe(&path).await;
        let metadata = self.read_metadata(&path, "Error analyzing image").await?;

        Ok(AnalysisResponse {
            image_id: image_id.to_string(),
            description: caption.into_text(),
            metadata,
            analysis_time: Utc::now(),
        })
    }

    pub async fn get_metadata(&self, image_id: &str) -> Result<MetadataResponse, AppError> {
        let path = self.image_store.locate(image_id).await?;
        let metadata = self.read_metadata(&path, "Error extracting metadata").await?;

        Ok(MetadataResponse {
            image_id: image_id.to_string(),
            metadata,
        })
    }

    pub async fn list_images(&self) -> Result<ImageListResponse, AppError> {
        let images = self.image_store.list().await?;
        Ok(ImageListResponse { images })
    }

    /// Loads the raw bytes of a stored image. A file that disappears
    /// between lookup and read is reported as not found.
    pub async fn load_image_file(&self, image_id: &str) -> Result<StoredImageFile, AppError> {
        let path = self.image_store.locate(image_id).await?;

        let bytes = fs::read(&path).await.map_err(AppError::from)?;

        Ok(StoredImageFile {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content_type: content_type_for(&path),
            bytes,
        })
    }

    async fn read_metadata(&self, path: &Path, context: &str) -> Result<ImageMetadata, AppError> {
        extract_metadata(path.to_path_buf())
            .await
            .map_err(|e| AppError::InternalError(format!("{}: {}", context, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::image::ImageListEntry;
    use crate::repositories::fs_repo::FsImageStore;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn stored_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    /// Stamps every save with a fixed time and deletes a file right after
    /// locating it, as if another request removed it mid-flight.
    struct RacyStore {
        inner: FsImageStore,
    }

    #[async_trait]
    impl ImageStore for RacyStore {
        async fn save(
            &self,
            data: &[u8],
            content_type: Option<&str>,
            original_filename: Option<&str>,
        ) -> Result<UploadedImage, AppError> {
            let mut uploaded = self.inner.save(data, content_type, original_filename).await?;
            uploaded.created_at = stored_at();
            Ok(uploaded)
        }

        async fn locate(&self, image_id: &str) -> Result<PathBuf, AppError> {
            let path = self.inner.locate(image_id).await?;
            std::fs::remove_file(&path)?;
            Ok(path)
        }

        async fn list(&self) -> Result<Vec<ImageListEntry>, AppError> {
            self.inner.list().await
        }

        async fn remove(&self, path: &Path) -> Result<(), AppError> {
            self.inner.remove(path).await
        }
    }

    async fn racy_handler() -> (TempDir, ImageAnalysisHandler<RacyStore>) {
        let dir = TempDir::new().unwrap();
        let inner = FsImageStore::open(dir.path()).await.unwrap();
        (dir, ImageAnalysisHandler::new(RacyStore { inner }, CaptionGenerator::unavailable()))
    }

    async fn handler() -> (TempDir, ImageAnalysisHandler<FsImageStore>) {
        let dir = TempDir::new().unwrap();
        let store = FsImageStore::open(dir.path()).await.unwrap();
        (dir, ImageAnalysisHandler::new(store, CaptionGenerator::unavailable()))
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn upload_returns_metadata_and_fallback_caption() {
        let (_dir, handler) = handler().await;

        let response = handler
            .upload_image(&jpeg(400, 300), Some("image/jpeg"), Some("test.jpg"))
            .await
            .unwrap();

        assert_eq!(response.original_filename, "test.jpg");
        assert_eq!(response.saved_filename, format!("{}.jpg", response.image_id));
        assert_eq!(response.metadata.format, "JPEG");
        assert_eq!((response.metadata.size.width, response.metadata.size.height), (400, 300));
        assert!(!response.description.is_empty());
    }

    #[tokio::test]
    async fn undecodable_upload_is_removed_and_reported() {
        let (_dir, handler) = handler().await;

        let err = handler
            .upload_image(b"not really a png", Some("image/png"), Some("fake.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InternalError(ref m) if m.starts_with("Error processing image")));
        assert!(handler.list_images().await.unwrap().images.is_empty());
    }

    #[tokio::test]
    async fn metadata_and_analysis_agree_with_upload() {
        let (_dir, handler) = handler().await;
        let uploaded = handler
            .upload_image(&jpeg(64, 48), Some("image/jpeg"), Some("small.jpeg"))
            .await
            .unwrap();

        let metadata = handler.get_metadata(&uploaded.image_id).await.unwrap();
        let analysis = handler.analyze_image(&uploaded.image_id).await.unwrap();

        assert_eq!(metadata.metadata.size, uploaded.metadata.size);
        assert_eq!(metadata.metadata.format, uploaded.metadata.format);
        assert_eq!(analysis.metadata.size, uploaded.metadata.size);
        assert_eq!(analysis.description, uploaded.description);
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found_everywhere() {
        let (_dir, handler) = handler().await;

        assert!(matches!(handler.analyze_image("missing").await, Err(AppError::NotFound(_))));
        assert!(matches!(handler.get_metadata("missing").await, Err(AppError::NotFound(_))));
        assert!(matches!(handler.load_image_file("missing").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn raw_file_keeps_bytes_and_type() {
        let (_dir, handler) = handler().await;
        let bytes = jpeg(8, 8);
        let uploaded = handler
            .upload_image(&bytes, Some("image/jpeg"), Some("tiny.JPG"))
            .await
            .unwrap();

        let file = handler.load_image_file(&uploaded.image_id).await.unwrap();

        assert_eq!(file.bytes, bytes);
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.filename, uploaded.saved_filename);
    }

    #[tokio::test]
    async fn upload_time_is_the_stored_record_time() {
        let (_dir, handler) = racy_handler().await;

        let response = handler
            .upload_image(&jpeg(8, 8), Some("image/jpeg"), Some("clock.jpg"))
            .await
            .unwrap();

        assert_eq!(response.upload_time, stored_at());
    }

    #[tokio::test]
    async fn file_removed_after_lookup_is_not_found() {
        let (_dir, handler) = racy_handler().await;
        let uploaded = handler
            .upload_image(&jpeg(8, 8), Some("image/jpeg"), Some("gone.jpg"))
            .await
            .unwrap();

        let err = handler.load_image_file(&uploaded.image_id).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref m) if m == "Image file not found"));
    }
}
