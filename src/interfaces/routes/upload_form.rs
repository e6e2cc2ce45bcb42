use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::errors::AppError;

/// Size limits for the upload form, with parse failures answered as JSON.
pub fn config_routes(max_upload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(
            MultipartFormConfig::default()
                .total_limit(max_upload_bytes)
                .memory_limit(max_upload_bytes)
                .error_handler(|err, _req| {
                    tracing::debug!("Rejected upload form: {}", err);
                    AppError::from(err).into()
                }),
        );
    }
}
