use std::collections::BTreeMap;
use std::path::PathBuf;

use actix_multipart::form::{bytes::Bytes, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ───── Upload Form ─────────────────────────────────────────────────

/// `multipart/form-data` body of `POST /upload`: a single `file` part.
#[derive(MultipartForm)]
pub struct ImageUploadForm {
    pub file: Bytes,
}

// ───── Stored Images ─────────────────────────────────────────────────

/// A file written to the image store by an upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub image_id: String,
    pub original_filename: String,
    pub saved_filename: String,
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// One file found while listing the image store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageListEntry {
    pub image_id: String,
    pub filename: String,
    pub size: u64,
    pub created: DateTime<Utc>,
}

/// Raw bytes of a stored image, ready to be served.
#[derive(Debug)]
pub struct StoredImageFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// ───── Derived Metadata ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// File and EXIF details read from an image. Recomputed on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub filename: String,
    pub format: String,
    pub mode: String,
    pub size: ImageSize,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    pub exif: BTreeMap<String, String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: String,
    pub original_filename: String,
    pub saved_filename: String,
    pub file_path: String,
    pub description: String,
    pub metadata: ImageMetadata,
    pub upload_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub image_id: String,
    pub description: String,
    pub metadata: ImageMetadata,
    pub analysis_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub image_id: String,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub images: Vec<ImageListEntry>,
}
