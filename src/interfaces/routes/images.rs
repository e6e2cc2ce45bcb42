use actix_web::web;

use crate::handlers::images;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/upload")
            .route(web::post().to(images::upload_image))
    )
    .service(
        web::resource("/analyze/{image_id}")
            .route(web::get().to(images::analyze_image))
    )
    .service(
        web::resource("/metadata/{image_id}")
            .route(web::get().to(images::get_image_metadata))
    )
    .service(
        web::resource("/images")
            .route(web::get().to(images::list_images))
    )
    .service(
        web::resource("/uploads/{image_id}")
            .route(web::get().to(images::serve_image))
    );
}
