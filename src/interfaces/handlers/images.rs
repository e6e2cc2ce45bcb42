use actix_multipart::form::MultipartForm;
use actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web, HttpResponse, Responder,
};
use tracing::instrument;

use crate::{entities::image::ImageUploadForm, errors::AppError, AppState};

#[instrument(skip(state, form))]
pub async fn upload_image(
    state: web::Data<AppState>,
    form: MultipartForm<ImageUploadForm>,
) -> Result<impl Responder, AppError> {
    let file = form.into_inner().file;
    let content_type = file.content_type.as_ref().map(|m| m.essence_str().to_string());

    tracing::info!(
        filename = ?file.file_name,
        content_type = ?content_type,
        bytes = file.data.len(),
        "Received upload"
    );

    let response = state
        .image_handler
        .upload_image(&file.data, content_type.as_deref(), file.file_name.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(state))]
pub async fn analyze_image(
    image_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let analysis = state.image_handler.analyze_image(&image_id).await?;
    Ok(HttpResponse::Ok().json(analysis))
}

#[instrument(skip(state))]
pub async fn get_image_metadata(
    image_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let metadata = state.image_handler.get_metadata(&image_id).await?;
    Ok(HttpResponse::Ok().json(metadata))
}

#[instrument(skip(state))]
pub async fn list_images(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let images = state.image_handler.list_images().await?;
    Ok(HttpResponse::Ok().json(images))
}

#[instrument(skip(state))]
pub async fn serve_image(
    image_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let file = state.image_handler.load_image_file(&image_id).await?;

    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(file.filename)],
        })
        .body(file.bytes))
}
