use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::{endpoint, read_json, require, AiImageMetadata, GenerateImage, GeneratedImage, ImageGateway, ImageProvider};

const DEFAULT_SIZE: &str = "512x512";
const DEFAULT_QUALITY: &str = "standard";
const DEFAULT_STYLE: &str = "natural";

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
    style: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// `/images/generations` reply, shared with OpenRouter.
#[derive(Debug, Deserialize)]
pub(super) struct ImagesResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageData {
    pub url: Option<String>,
}

impl ImagesResponse {
    pub(super) fn first_url(self) -> Result<String> {
        self.data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| Error::GenerationFailed("response carried no image url".into()))
    }
}

impl ImageGateway {
    pub(super) async fn generate_with_openai(&self, request: &GenerateImage) -> Result<GeneratedImage> {
        let api_key = require(&self.config.openai_api_key, "OPENAI_API_KEY")?;

        let size = request.size.as_deref().unwrap_or(DEFAULT_SIZE);
        let quality = request.quality.as_deref().unwrap_or(DEFAULT_QUALITY);
        let style = request.style.as_deref().unwrap_or(DEFAULT_STYLE);

        let response = self
            .client
            .post(endpoint(&self.config.openai_base_url, "/images/generations"))
            .bearer_auth(api_key)
            .json(&ImagesRequest {
                prompt: &request.prompt,
                n: 1,
                size,
                quality,
                style,
                model: request.model.as_deref(),
            })
            .send()
            .await;

        let image_url = read_json::<ImagesResponse>(response).await?.first_url()?;

        let metadata = AiImageMetadata {
            size: Some(size.to_owned()),
            quality: Some(quality.to_owned()),
            style: Some(style.to_owned()),
        };

        Ok(GeneratedImage::generated(ImageProvider::OpenAi, &request.prompt, image_url).with_metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::generation::fixtures::{config, gateway};

    #[tokio::test]
    async fn generates_with_dalle_defaults() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("Authorization", "Bearer openai-key"))
            .and(body_partial_json(json!({
                "prompt": "a red fox",
                "n": 1,
                "size": "512x512",
                "quality": "standard",
                "style": "natural"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "url": "https://images.test/fox.png" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = gateway(config(&server))
            .generate(GenerateImage::new("a red fox", ImageProvider::OpenAi))
            .await
            .unwrap();

        assert!(image.success);
        assert_eq!(image.image_url.as_deref(), Some("https://images.test/fox.png"));
        assert_eq!(image.provider, ImageProvider::OpenAi);
        assert_eq!(image.metadata.and_then(|m| m.size).as_deref(), Some("512x512"));
    }

    #[tokio::test]
    async fn provider_errors_fail_the_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = gateway(config(&server))
            .generate(GenerateImage::new("a red fox", ImageProvider::OpenAi))
            .await;

        assert!(matches!(result, Err(Error::GenerationFailed(detail)) if detail.contains("boom")));
    }

    #[tokio::test]
    async fn missing_key_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = config(&server);
        config.openai_api_key = None;

        let result = gateway(config)
            .generate(GenerateImage::new("a red fox", ImageProvider::OpenAi))
            .await;

        assert!(matches!(result, Err(Error::MissingConfiguration("OPENAI_API_KEY"))));
    }
}
