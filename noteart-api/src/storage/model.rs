use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadUrlResponse {
    /// Single-use URL accepting one `POST` of raw bytes.
    pub upload_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub storage_id: Uuid,
}

#[derive(Debug)]
pub struct Blob {
    pub content_type: String,
    pub data: Vec<u8>,
}
