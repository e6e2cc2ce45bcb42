use std::fmt;

use crate::constants::MODEL_UNAVAILABLE_CAPTION;

/// Why a caption had to fall back to placeholder text.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    ModelUnavailable,
    InferenceFailed(String),
}

/// Result of captioning one image. Captioning never fails a request,
/// so a model problem is carried as `Fallback` instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Caption {
    Generated(String),
    Fallback { reason: FallbackReason, text: String },
}

impl Caption {
    pub fn model_unavailable() -> Self {
        Caption::Fallback {
            reason: FallbackReason::ModelUnavailable,
            text: MODEL_UNAVAILABLE_CAPTION.to_string(),
        }
    }

    pub fn inference_failed(error: impl fmt::Display) -> Self {
        let error = error.to_string();
        Caption::Fallback {
            text: format!("Unable to generate AI description. Error: {}", error),
            reason: FallbackReason::InferenceFailed(error),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Caption::Generated(text) => text,
            Caption::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Caption::Fallback { .. })
    }

    pub fn into_text(self) -> String {
        match self {
            Caption::Generated(text) => text,
            Caption::Fallback { text, .. } => text,
        }
    }
}
