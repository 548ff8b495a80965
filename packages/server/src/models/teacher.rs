use chrono::{DateTime, Utc};
use common::Gender;
use serde::{Deserialize, Serialize};

use super::shared::{validate_length, validate_url};
use crate::entity::{teacher, user};
use crate::error::AppError;

/// The caller's teacher profile. Creates it on first use.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpsertTeacherRequest {
    #[schema(example = "T-0042")]
    pub personal_id: String,
    #[schema(example = "Dr. Farhana Islam")]
    pub name: String,
    pub gender: Gender,
    pub department_id: i32,
    pub image: Option<String>,
    #[serde(default)]
    pub is_intake_incharge: bool,
}

pub fn validate_upsert_teacher(payload: &UpsertTeacherRequest) -> Result<(), AppError> {
    validate_length("Personal ID", &payload.personal_id, 1, 150)?;
    validate_length("Name", &payload.name, 2, 350)?;
    if let Some(image) = payload.image.as_deref().filter(|s| !s.trim().is_empty()) {
        validate_url("image", image)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeacherProfileResponse {
    pub id: i32,
    pub user_id: i32,
    pub personal_id: String,
    pub name: String,
    pub gender: Gender,
    pub image: Option<String>,
    pub department_id: i32,
    pub is_intake_incharge: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<teacher::Model> for TeacherProfileResponse {
    fn from(m: teacher::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            personal_id: m.personal_id,
            name: m.name,
            gender: m.gender,
            image: m.image,
            department_id: m.department_id,
            is_intake_incharge: m.is_intake_incharge,
            updated_at: m.updated_at,
        }
    }
}

/// An active teacher account, as offered when picking a schedule's teacher.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TeacherSummary {
    /// Account ID.
    pub id: i32,
    pub email: String,
    /// Profile name, else the account's full name, else the email.
    pub name: String,
    pub profile: Option<TeacherProfileResponse>,
}

impl TeacherSummary {
    pub fn new(account: user::Model, profile: Option<teacher::Model>) -> Self {
        let name = match &profile {
            Some(p) => p.name.clone(),
            None if !account.full_name.trim().is_empty() => account.full_name.clone(),
            None => account.email.clone(),
        };
        Self {
            id: account.id,
            email: account.email,
            name,
            profile: profile.map(Into::into),
        }
    }
}
