//! Walks a running image analysis API through health, upload, analyze,
//! metadata and listing calls. Target with `API_BASE` (default
//! `http://localhost:4444`).

use std::io::Cursor;

use anyhow::{bail, Context};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use image_analysis_api::entities::image::{
    AnalysisResponse, ImageListResponse, MetadataResponse, UploadResponse,
};
use reqwest::{multipart, Client, Response};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn test_image() -> anyhow::Result<Vec<u8>> {
    let img = RgbImage::from_pixel(400, 300, Rgb([173, 216, 230]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
    Ok(bytes)
}

async fn expect_ok(response: Response, step: &str) -> anyhow::Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("{} failed ({}): {}", step, status, body);
    }
    Ok(response)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let base = std::env::var("API_BASE").unwrap_or_else(|_| "http://localhost:4444".to_string());
    let base = base.trim_end_matches('/');
    let client = Client::new();

    info!("🔍 Health check against {}", base);
    let health: serde_json::Value = expect_ok(
        client
            .get(format!("{}/", base))
            .send()
            .await
            .with_context(|| format!("Could not connect to API server at {}", base))?,
        "Health check",
    )
    .await?
    .json()
    .await?;
    info!("AI model loaded: {}", health["ai_model_loaded"]);

    info!("📤 Uploading 400x300 test image");
    let part = multipart::Part::bytes(test_image()?)
        .file_name("test_image.jpg")
        .mime_str("image/jpeg")?;
    let upload: UploadResponse = expect_ok(
        client
            .post(format!("{}/upload", base))
            .multipart(multipart::Form::new().part("file", part))
            .send()
            .await?,
        "Upload",
    )
    .await?
    .json()
    .await?;
    info!(
        image_id = %upload.image_id,
        "✅ Uploaded: {} ({} bytes, {}x{})",
        upload.description,
        upload.metadata.file_size,
        upload.metadata.size.width,
        upload.metadata.size.height
    );

    info!("🧠 Analyzing {}", upload.image_id);
    let analysis: AnalysisResponse = expect_ok(
        client
            .get(format!("{}/analyze/{}", base, upload.image_id))
            .send()
            .await?,
        "Analysis",
    )
    .await?
    .json()
    .await?;
    info!("✅ Description: {}", analysis.description);

    info!("📊 Fetching metadata for {}", upload.image_id);
    let metadata: MetadataResponse = expect_ok(
        client
            .get(format!("{}/metadata/{}", base, upload.image_id))
            .send()
            .await?,
        "Metadata",
    )
    .await?
    .json()
    .await?;
    info!(
        "✅ Format: {}, mode: {}, size: {}x{}, EXIF entries: {}",
        metadata.metadata.format,
        metadata.metadata.mode,
        metadata.metadata.size.width,
        metadata.metadata.size.height,
        metadata.metadata.exif.len()
    );

    info!("📋 Listing images");
    let listing: ImageListResponse = expect_ok(
        client.get(format!("{}/images", base)).send().await?,
        "Listing",
    )
    .await?
    .json()
    .await?;
    info!("✅ Total images: {}", listing.images.len());
    for image in listing.images.iter().take(3) {
        info!("  - {} ({} bytes)", image.filename, image.size);
    }

    info!("✅ All checks completed");
    Ok(())
}
