use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Bearer credentials handed out on sign-in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub user: Option<User>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignOutResponse {
    pub success: bool,
}
