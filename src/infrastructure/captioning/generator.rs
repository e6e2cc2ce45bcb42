use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use crate::{
    entities::caption::Caption,
    errors::CaptionError,
    settings::CaptionConfig,
};

use super::{
    http_model::HttpCaptionModel,
    model::{prepare_input, strip_special_tokens, CaptionModel, GenerationParams},
};

/// Produces captions for stored images. Built once at startup and shared
/// read-only by every worker; a model that failed to load stays absent
/// for the life of the process.
pub struct CaptionGenerator {
    model: Option<Arc<dyn CaptionModel>>,
    params: GenerationParams,
    permits: Arc<Semaphore>,
}

impl CaptionGenerator {
    /// Attempts to bring up the configured model exactly once.
    pub async fn initialize(config: &CaptionConfig) -> Self {
        match HttpCaptionModel::connect(config).await {
            Ok(model) => {
                info!(model = %model.model_name(), "AI model loaded successfully");
                Self::with_model(Arc::new(model), config.max_concurrent_inferences)
            }
            Err(CaptionError::NotConfigured) => {
                warn!("No caption endpoint configured, descriptions will use fallback text");
                Self::unavailable()
            }
            Err(e) => {
                error!("Error loading AI model: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn with_model(model: Arc<dyn CaptionModel>, max_concurrent_inferences: usize) -> Self {
        CaptionGenerator {
            model: Some(model),
            params: GenerationParams::default(),
            permits: Arc::new(Semaphore::new(max_concurrent_inferences.max(1))),
        }
    }

    pub fn unavailable() -> Self {
        CaptionGenerator {
            model: None,
            params: GenerationParams::default(),
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Never fails: model absence or any inference error degrades to fallback text.
    #[instrument(skip(self))]
    pub async fn describe(&self, path: &Path) -> Caption {
        let Some(model) = &self.model else {
            return Caption::model_unavailable();
        };

        match self.run(model.as_ref(), path).await {
            Ok(text) => Caption::Generated(text),
            Err(e) => {
                warn!("Error generating description: {}", e);
                Caption::inference_failed(e)
            }
        }
    }

    async fn run(&self, model: &dyn CaptionModel, path: &Path) -> Result<String, CaptionError> {
        let path = path.to_path_buf();
        let input = tokio::task::spawn_blocking(move || prepare_input(&path))
            .await
            .map_err(|e| CaptionError::Preprocessing(e.to_string()))??;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| CaptionError::Initialization(e.to_string()))?;

        let raw = model.generate(&input, &self.params).await?;
        let text = strip_special_tokens(&raw);
        if text.is_empty() {
            return Err(CaptionError::EmptyCaption);
        }

        Ok(text)
    }
}
