use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::ai_images::AiImage;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Blob references. Falls back to `[image_id]` for rows that only carry the legacy column.
    pub image_ids: Vec<Uuid>,
    pub image_id: Option<Uuid>,
    pub ai_generated_images: Vec<AiImage>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A note as returned to clients, with blob references resolved to URLs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    /// Same order as `image_ids`; `null` where a reference could not be resolved.
    pub image_urls: Vec<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateNote {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_ids: Option<Vec<Uuid>>,
}

/// Every field is overwritten; omitted optionals reset to empty.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct UpdateNote {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FindNotesQuery {
    /// Full-text query over note content. Blank lists every note.
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FindNotesResponse {
    pub results: Vec<NoteView>,
}
