use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{Error, Result};

use super::{
    endpoint, openai::ImagesResponse, read_json, require, EditImage, GenerateImage, GeneratedImage, ImageGateway,
    ImageProvider,
};

const DEFAULT_MODEL: &str = "stability-ai/stable-diffusion-3";
const DEFAULT_EDIT_MODEL: &str = "google/gemini-2.5-flash-image-preview";
const APP_TITLE: &str = "NoteArt AI";

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    images: Vec<MessageImage>,
}

#[derive(Debug, Deserialize)]
struct MessageImage {
    image_url: ImageUrl,
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    url: String,
}

impl ChatResponse {
    fn first_image(self) -> Option<String> {
        let choice = self.choices.into_iter().next()?;
        let image = choice.message.images.into_iter().next()?;
        Some(image.image_url.url)
    }
}

impl ImageGateway {
    fn openrouter_post(&self, path: &str) -> Result<reqwest::RequestBuilder> {
        let api_key = require(&self.config.openrouter_api_key, "OPENROUTER_API_KEY")?;
        let site_url = require(&self.config.site_url, "SITE_URL")?;

        Ok(self
            .client
            .post(endpoint(&self.config.openrouter_base_url, path))
            .bearer_auth(api_key)
            .header("HTTP-Referer", site_url)
            .header("X-Title", APP_TITLE))
    }

    pub(super) async fn generate_with_openrouter(&self, request: &GenerateImage) -> Result<GeneratedImage> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let response = self
            .openrouter_post("/images/generations")?
            .json(&ImagesRequest {
                model,
                prompt: &request.prompt,
                n: 1,
            })
            .send()
            .await;

        let image_url = read_json::<ImagesResponse>(response).await?.first_url()?;

        Ok(GeneratedImage::generated(ImageProvider::OpenRouter, &request.prompt, image_url))
    }

    /// Sends the source image and the instruction to an image-capable chat model.
    pub(super) async fn edit_with_openrouter(&self, request: &EditImage) -> Result<GeneratedImage> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_EDIT_MODEL);

        let response = self
            .openrouter_post("/chat/completions")?
            .json(&json!({
                "model": model,
                "modalities": ["image", "text"],
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "text", "text": request.prompt },
                        { "type": "image_url", "image_url": { "url": request.image_url } }
                    ]
                }]
            }))
            .send()
            .await;

        let image_url = read_json::<ChatResponse>(response)
            .await?
            .first_image()
            .ok_or_else(|| Error::GenerationFailed("model returned no image".into()))?;

        Ok(GeneratedImage::generated(ImageProvider::OpenRouter, &request.prompt, image_url))
    }
}
