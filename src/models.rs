use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Response Envelopes =====

/// Wrapper used by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Simple message wrapper for acknowledgement responses.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ===== Identity Models =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct UserProfile {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub is_coach: bool,
    pub school_id: Option<Uuid>,
    pub level_of_education: Option<String>,
    pub section: Option<String>,
    pub external_id: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// Student listing row joining a user with their profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct StudentSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub name: String,
    pub level_of_education: Option<String>,
    pub section: Option<String>,
    pub external_id: Option<String>,
}
