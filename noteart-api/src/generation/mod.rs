mod imagen;
mod model;
mod openai;
mod openrouter;
mod routes;

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use utoipa_axum::router::OpenApiRouter;

pub use model::*;

use crate::{config::Config, state::AppState, Error, Result};

/// Credentials and endpoints for every provider, injected once at start-up.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    /// Sent to OpenRouter as `HTTP-Referer`.
    pub site_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub imagen_base_url: String,
    pub imagen_project: Option<String>,
    pub imagen_location: String,
    pub timeout_secs: u64,
}

impl From<&Config> for GatewayConfig {
    fn from(config: &Config) -> Self {
        Self {
            openai_api_key: config.openai_api_key.clone(),
            openai_base_url: config.openai_base_url.clone(),
            openrouter_api_key: config.openrouter_api_key.clone(),
            openrouter_base_url: config.openrouter_base_url.clone(),
            site_url: config.site_url.clone(),
            gemini_api_key: config.gemini_api_key.clone(),
            imagen_base_url: config.imagen_base_url.clone(),
            imagen_project: config.imagen_project.clone(),
            imagen_location: config.imagen_location.clone(),
            timeout_secs: config.generation_timeout_secs,
        }
    }
}

/// Single entry point to the image providers. One attempt per call, no retries.
#[derive(Clone)]
pub struct ImageGateway {
    client: Client,
    config: Arc<GatewayConfig>,
}

impl ImageGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Unexpected(format!("failed to build http client: {e}")))?;

        tracing::info!(
            openai = config.openai_api_key.is_some(),
            openrouter = config.openrouter_api_key.is_some(),
            imagen = config.gemini_api_key.is_some(),
            "image gateway ready"
        );

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub async fn generate(&self, request: GenerateImage) -> Result<GeneratedImage> {
        if request.prompt.trim().is_empty() {
            return Err(Error::Validation("Prompt must not be empty".into()));
        }

        tracing::debug!(provider = %request.provider, "generating image");

        match request.provider {
            ImageProvider::OpenAi => self.generate_with_openai(&request).await,
            ImageProvider::OpenRouter => self.generate_with_openrouter(&request).await,
            ImageProvider::Imagen => self.generate_with_imagen(&request).await,
        }
    }

    pub async fn edit(&self, request: EditImage) -> Result<GeneratedImage> {
        if request.prompt.trim().is_empty() {
            return Err(Error::Validation("Prompt must not be empty".into()));
        }
        if request.image_url.trim().is_empty() {
            return Err(Error::Validation("Image URL must not be empty".into()));
        }

        self.edit_with_openrouter(&request).await
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(Error::MissingConfiguration(name))
}

/// Reads a 2xx JSON body; anything else is a generation failure carrying the provider's reply.
async fn read_json<T: DeserializeOwned>(response: reqwest::Result<Response>) -> Result<T> {
    let response = response.map_err(|e| Error::GenerationFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::GenerationFailed(format!("{status}: {body}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| Error::GenerationFailed(e.to_string()))
}

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new().merge(routes::router(state))
}
