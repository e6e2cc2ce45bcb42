use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    errors::CaptionError,
    settings::CaptionConfig,
};

use super::model::{CaptionInput, CaptionModel, GenerationParams};

const MAX_ERROR_BODY: usize = 500;

/// Caption model served by an HTTP inference endpoint that accepts a
/// base64 image and returns `generated_text`.
#[derive(Debug, Clone)]
pub struct HttpCaptionModel {
    client: Client,
    endpoint: Url,
    api_token: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct CaptionRequest<'a> {
    inputs: String,
    parameters: &'a GenerationParams,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaptionResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

impl CaptionResponse {
    fn into_text(self) -> Option<String> {
        match self {
            CaptionResponse::Batch(items) => items.into_iter().next().map(|g| g.generated_text),
            CaptionResponse::Single(item) => Some(item.generated_text),
        }
    }
}

impl HttpCaptionModel {
    /// Builds the client and, when configured, checks that the endpoint answers.
    pub async fn connect(config: &CaptionConfig) -> Result<Self, CaptionError> {
        let endpoint = config.endpoint.as_deref().ok_or(CaptionError::NotConfigured)?;
        let endpoint = Url::parse(endpoint)
            .map_err(|e| CaptionError::Initialization(format!("invalid endpoint: {}", e)))?;

        let mut builder = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| CaptionError::Initialization(e.to_string()))?;

        let model = HttpCaptionModel {
            client,
            endpoint,
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            model: config.model.clone(),
        };

        if config.probe_on_startup {
            model.probe().await?;
        }

        Ok(model)
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn probe(&self) -> Result<(), CaptionError> {
        let response = self
            .authorized(self.client.get(self.endpoint.clone()))
            .send()
            .await
            .map_err(|e| CaptionError::Initialization(format!("endpoint unreachable: {}", e)))?;

        // Inference routes usually only accept POST, so a GET may see 404 or 405.
        // Any answer short of a server error or an auth rejection means the host is up.
        let status = response.status();
        if status.is_server_error()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            Err(CaptionError::Initialization(format!("endpoint answered {}", status)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CaptionModel for HttpCaptionModel {
    async fn generate(
        &self,
        input: &CaptionInput,
        params: &GenerationParams,
    ) -> Result<String, CaptionError> {
        let payload = CaptionRequest {
            inputs: general_purpose::STANDARD.encode(&input.png),
            parameters: params,
        };

        tracing::debug!(model = %self.model, width = input.width, height = input.height, "Sending caption request");

        let response = self
            .authorized(self.client.post(self.endpoint.clone()))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(CaptionError::Inference { status: status.as_u16(), body });
        }

        let parsed: CaptionResponse = response.json().await?;
        parsed.into_text().ok_or(CaptionError::EmptyCaption)
    }
}
