use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::Utc;
use exif::{In, Reader, Value};
use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};

use crate::{
    entities::image::{ImageMetadata, ImageSize},
    errors::{AppError, MetadataError},
};

/// Runs [`read_metadata`] on the blocking pool. An unreadable image is a
/// client error; callers decide how to surface it.
pub async fn extract_metadata(path: PathBuf) -> Result<ImageMetadata, AppError> {
    tokio::task::spawn_blocking(move || read_metadata(&path))
        .await?
        .map_err(|e| AppError::InvalidInput(e.to_string()))
}

/// Opens the image at `path` and collects its format, color mode,
/// dimensions, file size and EXIF tags.
pub fn read_metadata(path: &Path) -> Result<ImageMetadata, MetadataError> {
    let file_size = std::fs::metadata(path).map_err(MetadataError::Open)?.len();

    let reader = ImageReader::open(path)
        .map_err(MetadataError::Open)?
        .with_guessed_format()
        .map_err(MetadataError::Open)?;

    let format = reader.format();
    let decoder = reader.into_decoder().map_err(MetadataError::Decode)?;
    let (width, height) = decoder.dimensions();
    let mode = color_mode(decoder.color_type());

    Ok(ImageMetadata {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        format: format.map(format_name).unwrap_or_else(|| "UNKNOWN".to_string()),
        mode: mode.to_string(),
        size: ImageSize { width, height },
        file_size,
        created_at: Utc::now(),
        exif: read_exif(path),
    })
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "UNKNOWN",
    }
}

/// Missing or unreadable EXIF yields an empty map, never an error.
fn read_exif(path: &Path) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    let Ok(file) = File::open(path) else {
        return tags;
    };
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return tags,
        Err(e) => {
            tracing::debug!(path = %path.display(), "Ignoring unreadable EXIF: {}", e);
            return tags;
        }
    };

    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let name = match field.tag.description() {
            Some(_) => field.tag.to_string(),
            None => field.tag.number().to_string(),
        };
        tags.insert(name, stringify_value(field));
    }

    tags
}

fn stringify_value(field: &exif::Field) -> String {
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
            .collect::<Vec<_>>()
            .join(", "),
        _ => field.display_value().to_string(),
    }
}
