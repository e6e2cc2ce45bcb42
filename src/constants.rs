use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Extensions accepted on upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

pub const CAPTION_NUM_BEAMS: u32 = 5;
pub const CAPTION_MAX_LENGTH: u32 = 50;

pub const MODEL_UNAVAILABLE_CAPTION: &str =
    "AI model not available. Using basic description based on filename.";
