use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::generation::{AiImageMetadata, ImageProvider};

/// A generated image saved on a note. Stored inline in the note's `ai_generated_images` column.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct AiImage {
    /// Stable address, unlike the position in the list.
    pub id: Uuid,
    pub url: String,
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
    pub provider: ImageProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AiImageMetadata>,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct AddAiImage {
    pub image_url: String,
    pub prompt: String,
    pub provider: ImageProvider,
    pub metadata: Option<AiImageMetadata>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddAiImageResponse {
    pub success: bool,
    pub image_id: Uuid,
    /// Position of the new image; only valid until the list changes.
    pub index: usize,
    pub ai_image: AiImage,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveAiImageResponse {
    pub success: bool,
    pub removed: AiImage,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListAiImagesResponse {
    pub results: Vec<AiImage>,
}
