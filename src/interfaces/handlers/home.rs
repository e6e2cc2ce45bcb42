use std::time::Duration;

use actix_web::{get, web, HttpResponse, Responder};
use humantime::format_duration;

use crate::{constants::START_TIME, AppState};

#[get("/")]
pub async fn home(state: web::Data<AppState>) -> impl Responder {
    let uptime = chrono::Utc::now().signed_duration_since(*START_TIME);
    let uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Image Analysis API is running",
        "ai_model_loaded": state.image_handler.is_model_loaded(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": uptime.to_string(),
        "endpoints": {
            "upload": "/upload",
            "analyze": "/analyze/{image_id}",
            "metadata": "/metadata/{image_id}",
            "images": "/images",
            "uploads": "/uploads/{image_id}"
        }
    }))
}
