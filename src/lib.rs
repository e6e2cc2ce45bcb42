mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{captioning, metadata, utils};

use captioning::generator::CaptionGenerator;
use repositories::fs_repo::FsImageStore;
use use_cases::images::ImageAnalysisHandler;

pub struct AppState {
    pub image_handler: AppImageHandler,
}

pub type AppImageHandler = ImageAnalysisHandler<FsImageStore>;

impl AppState {
    pub fn new(image_store: FsImageStore, captioner: CaptionGenerator) -> Self {
        AppState {
            image_handler: ImageAnalysisHandler::new(image_store, captioner),
        }
    }

    /// Opens the upload directory and makes the one startup attempt at
    /// loading the caption model.
    pub async fn from_config(config: &settings::AppConfig) -> Result<Self, errors::AppError> {
        let image_store = FsImageStore::open(&config.upload_dir).await?;
        let captioner = CaptionGenerator::initialize(&config.caption).await;

        Ok(AppState::new(image_store, captioner))
    }
}
