use actix_cors::Cors;
use actix_web::web;

use crate::handlers::{home::home, json_error::route_not_found};

mod images;
mod upload_form;

/// Registers every route of the service. `max_upload_bytes` caps the
/// multipart body accepted by `POST /upload`.
pub fn configure_routes(max_upload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(home);

        cfg.configure(images::config_routes);
        cfg.configure(upload_form::config_routes(max_upload_bytes));

        cfg.default_service(web::route().to(route_not_found));
    }
}

/// CORS policy for the given origins; a `*` entry allows any origin.
pub fn build_cors(origins: &[String]) -> Cors {
    if origins.iter().any(|o| o == "*") {
        return Cors::permissive();
    }

    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}
