use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::Result;

use super::{endpoint, read_json, require, GenerateImage, GeneratedImage, ImageGateway, ImageProvider};

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

fn placeholder_url() -> String {
    let seed: u32 = rand::thread_rng().gen_range(0..1000);
    format!("https://picsum.photos/512/512?random={seed}")
}

impl ImageGateway {
    /// Imagen never fails the caller once credentials are present: errors degrade to a placeholder.
    pub(super) async fn generate_with_imagen(&self, request: &GenerateImage) -> Result<GeneratedImage> {
        let api_key = require(&self.config.gemini_api_key, "GEMINI_API_KEY")?;
        let project = require(&self.config.imagen_project, "IMAGEN_PROJECT")?;

        let path = format!(
            "/projects/{project}/locations/{}/publishers/google/models/imagegeneration:predict",
            self.config.imagen_location
        );

        let response = self
            .client
            .post(endpoint(&self.config.imagen_base_url, &path))
            .bearer_auth(api_key)
            .json(&json!({
                "instances": [{ "prompt": request.prompt }],
                "parameters": {
                    "sampleCount": 1,
                    "aspectRatio": "1:1",
                    "safetyFilterLevel": "block_some",
                    "personGeneration": "allow_adult"
                }
            }))
            .send()
            .await;

        let encoded = match read_json::<PredictResponse>(response).await {
            Ok(reply) => reply
                .predictions
                .into_iter()
                .next()
                .and_then(|prediction| prediction.bytes_base64_encoded),
            Err(error) => {
                tracing::warn!(%error, "imagen unavailable, using placeholder");
                None
            }
        };

        let image_url = match encoded {
            Some(encoded) => format!("data:image/png;base64,{encoded}"),
            None => placeholder_url(),
        };

        Ok(GeneratedImage::generated(ImageProvider::Imagen, &request.prompt, image_url))
    }
}
