use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_length;
use crate::entity::room;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRoomRequest {
    #[schema(example = "CSE-2201 Data Structures")]
    pub title: String,
    pub description: Option<String>,
}

pub fn validate_create_room(payload: &CreateRoomRequest) -> Result<(), AppError> {
    validate_length("Title", &payload.title, 1, 150)?;
    if let Some(desc) = &payload.description {
        validate_length("Description", desc, 0, 500)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct JoinRoomRequest {
    /// Six-character join code, case-insensitive.
    #[schema(example = "K7QP2M")]
    pub code: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoomResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub code: String,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<room::Model> for RoomResponse {
    fn from(m: room::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            code: m.code,
            owner_id: m.owner_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoomMemberResponse {
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoomDetailResponse {
    #[serde(flatten)]
    pub room: RoomResponse,
    pub members: Vec<RoomMemberResponse>,
}
