use std::fmt;
use std::io;

use actix_web::{
    error::{PayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use actix_multipart::MultipartError;
use derive_more::{Display, Error};

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    NotFound(String),
    PayloadTooLarge(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "{}", msg),
            AppError::InternalError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::InternalError(_) => "internal_server_error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        if !self.is_client_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(serde_json::json!({
                "error": self.kind(),
                "detail": self.to_string()
            }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AppError::NotFound("Image file not found".to_string()),
            _ => AppError::InternalError(format!("IO error: {}", err)),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("Background task failed: {}", err))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err {
            MultipartError::Payload(PayloadError::Overflow) => {
                AppError::PayloadTooLarge("File too large".to_string())
            }
            MultipartError::Payload(e) => {
                AppError::InvalidInput(format!("Upload body could not be read: {}", e))
            }
            MultipartError::ContentTypeMissing
            | MultipartError::ContentTypeParse
            | MultipartError::ContentTypeIncompatible => {
                AppError::InvalidInput("Request must be multipart/form-data".to_string())
            }
            _ => AppError::InvalidInput(format!("Invalid upload form: {}", err)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Failures while reading an image file for metadata.
#[derive(Debug, Display, Error)]
pub enum MetadataError {
    #[display("Cannot open image file: {_0}")]
    Open(io::Error),

    #[display("Cannot parse image: {_0}")]
    Decode(image::ImageError),
}

/// Failures from the caption model, at startup or during inference.
#[derive(Debug, Display, Error)]
pub enum CaptionError {
    #[display("Caption model endpoint is not configured")]
    NotConfigured,

    #[display("Caption model initialization failed: {_0}")]
    #[error(ignore)]
    Initialization(String),

    #[display("Cannot prepare image for captioning: {_0}")]
    #[error(ignore)]
    Preprocessing(String),

    #[display("Caption request failed: {_0}")]
    Request(reqwest::Error),

    #[display("Caption model returned {status}: {body}")]
    Inference { status: u16, body: String },

    #[display("Caption model returned an empty caption")]
    EmptyCaption,
}

impl From<reqwest::Error> for CaptionError {
    fn from(err: reqwest::Error) -> Self {
        CaptionError::Request(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert!(AppError::NotFound("x".into()).is_client_error());
        assert!(!AppError::InternalError("x".into()).is_client_error());
    }

    #[test]
    fn missing_file_on_disk_is_not_found() {
        let err = AppError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, AppError::NotFound(_)));

        let err = AppError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[test]
    fn multipart_overflow_is_payload_too_large() {
        let err = AppError::from(MultipartError::Payload(PayloadError::Overflow));
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let err = AppError::from(MultipartError::MissingField("file".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn broken_upload_body_is_bad_request() {
        for payload in [PayloadError::Incomplete(None), PayloadError::EncodingCorrupted] {
            let err = AppError::from(MultipartError::Payload(payload));
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn error_body_carries_kind_and_detail() {
        let response = AppError::NotFound("Image not found".into()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
