use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTag {
    pub name: String,
    pub color: String,
}

/// Full replacement of a tag's fields.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTag {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListTagsResponse {
    pub results: Vec<Tag>,
}
