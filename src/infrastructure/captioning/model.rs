use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use image::{ImageFormat, ImageReader};
use serde::Serialize;

use crate::{
    constants::{CAPTION_MAX_LENGTH, CAPTION_NUM_BEAMS},
    errors::CaptionError,
};

/// Tokens a vision-language decoder may leave in its output.
const SPECIAL_TOKENS: [&str; 10] = [
    "[CLS]", "[SEP]", "[PAD]", "[UNK]", "[MASK]", "[DEC]", "<s>", "</s>", "<pad>", "<unk>",
];

/// An image already converted to 8-bit RGB and re-encoded as PNG.
#[derive(Debug, Clone)]
pub struct CaptionInput {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decoding settings passed to the model on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationParams {
    pub num_beams: u32,
    pub max_length: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            num_beams: CAPTION_NUM_BEAMS,
            max_length: CAPTION_MAX_LENGTH,
        }
    }
}

/// A pretrained image captioning model, treated as an opaque function.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionModel: Send + Sync {
    /// Returns the raw decoded text; special tokens may still be present.
    async fn generate(
        &self,
        input: &CaptionInput,
        params: &GenerationParams,
    ) -> Result<String, CaptionError>;
}

/// Decodes the file at `path`, drops any alpha or palette and re-encodes
/// the 3-channel result losslessly.
pub fn prepare_input(path: &Path) -> Result<CaptionInput, CaptionError> {
    let image = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| CaptionError::Preprocessing(e.to_string()))?
        .decode()
        .map_err(|e| CaptionError::Preprocessing(e.to_string()))?
        .to_rgb8();
    let (width, height) = image.dimensions();

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| CaptionError::Preprocessing(e.to_string()))?;

    Ok(CaptionInput { png, width, height })
}

pub fn strip_special_tokens(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            SPECIAL_TOKENS
                .iter()
                .fold(word.to_string(), |acc, token| acc.replace(token, ""))
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
