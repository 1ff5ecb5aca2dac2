use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    /// DALL·E images API.
    OpenAi,
    OpenRouter,
    /// Vertex AI Imagen `:predict`.
    Imagen,
}

impl fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Imagen => "imagen",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
pub struct AiImageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct GenerateImage {
    pub prompt: String,
    pub provider: ImageProvider,
    /// Provider model override.
    pub model: Option<String>,
    pub size: Option<String>,
    pub quality: Option<String>,
    pub style: Option<String>,
}

impl GenerateImage {
    pub fn new(prompt: impl Into<String>, provider: ImageProvider) -> Self {
        Self {
            prompt: prompt.into(),
            provider,
            model: None,
            size: None,
            quality: None,
            style: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct EditImage {
    pub prompt: String,
    pub image_url: String,
    pub model: Option<String>,
}

/// Provider-independent outcome of a generation call. Nothing is persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct GeneratedImage {
    pub success: bool,
    pub image_url: Option<String>,
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
    pub provider: ImageProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AiImageMetadata>,
}

impl GeneratedImage {
    pub(super) fn generated(provider: ImageProvider, prompt: &str, image_url: String) -> Self {
        Self {
            success: true,
            image_url: Some(image_url),
            prompt: prompt.to_owned(),
            generated_at: Utc::now(),
            provider,
            metadata: None,
        }
    }

    pub(super) fn with_metadata(mut self, metadata: AiImageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
