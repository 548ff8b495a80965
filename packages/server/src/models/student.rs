use chrono::{DateTime, Utc};
use common::{Gender, Shift};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_length, validate_url};
use crate::entity::student;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateStudentRequest {
    /// Institution-issued ID, unique across students.
    #[schema(example = "201-15-3344")]
    pub personal_id: String,
    #[schema(example = "Ada Rahman")]
    pub name: String,
    pub gender: Gender,
    pub intake_id: Option<i32>,
    pub section_id: i32,
    pub department_id: i32,
    pub shift: Shift,
    /// Uploaded file URL of a profile picture.
    pub image: Option<String>,
    /// 10-15 digits.
    #[schema(example = "01712345678")]
    pub contact_number: Option<String>,
    pub facebook_profile: Option<String>,
}

/// Partial update. `is_class_cr` may only be changed by `student:manage`.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateStudentRequest {
    pub personal_id: Option<String>,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub intake_id: Option<i32>,
    pub section_id: Option<i32>,
    pub department_id: Option<i32>,
    pub shift: Option<Shift>,
    pub image: Option<String>,
    pub contact_number: Option<String>,
    pub facebook_profile: Option<String>,
    pub is_class_cr: Option<bool>,
}

fn validate_contact_number(value: &str) -> Result<(), AppError> {
    let value = value.trim();
    if !(10..=15).contains(&value.len()) || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Contact number must be 10-15 digits".into(),
        ));
    }
    Ok(())
}

fn validate_optional_fields(
    image: Option<&str>,
    contact_number: Option<&str>,
    facebook_profile: Option<&str>,
) -> Result<(), AppError> {
    if let Some(image) = image.filter(|s| !s.trim().is_empty()) {
        validate_url("image", image)?;
    }
    if let Some(number) = contact_number.filter(|s| !s.trim().is_empty()) {
        validate_contact_number(number)?;
    }
    if let Some(link) = facebook_profile.filter(|s| !s.trim().is_empty()) {
        validate_length("Facebook profile", link, 0, 500)?;
        validate_url("facebook_profile", link)?;
    }
    Ok(())
}

pub fn validate_create_student(payload: &CreateStudentRequest) -> Result<(), AppError> {
    validate_length("Personal ID", &payload.personal_id, 1, 150)?;
    validate_length("Name", &payload.name, 2, 350)?;
    validate_optional_fields(
        payload.image.as_deref(),
        payload.contact_number.as_deref(),
        payload.facebook_profile.as_deref(),
    )
}

pub fn validate_update_student(payload: &UpdateStudentRequest) -> Result<(), AppError> {
    if let Some(id) = &payload.personal_id {
        validate_length("Personal ID", id, 1, 150)?;
    }
    if let Some(name) = &payload.name {
        validate_length("Name", name, 2, 350)?;
    }
    validate_optional_fields(
        payload.image.as_deref(),
        payload.contact_number.as_deref(),
        payload.facebook_profile.as_deref(),
    )
}

/// Trimmed value, or `None` for a blank one.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub user_id: i32,
    pub personal_id: String,
    pub name: String,
    pub gender: Gender,
    pub image: Option<String>,
    pub intake_id: Option<i32>,
    pub section_id: i32,
    pub department_id: i32,
    pub shift: Shift,
    pub is_class_cr: bool,
    pub contact_number: Option<String>,
    pub facebook_profile: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<student::Model> for StudentResponse {
    fn from(m: student::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            personal_id: m.personal_id,
            name: m.name,
            gender: m.gender,
            image: m.image,
            intake_id: m.intake_id,
            section_id: m.section_id,
            department_id: m.department_id,
            shift: m.shift,
            is_class_cr: m.is_class_cr,
            contact_number: m.contact_number,
            facebook_profile: m.facebook_profile,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub intake_id: Option<i32>,
    pub section_id: Option<i32>,
    pub department_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<StudentResponse>,
    pub pagination: Pagination,
}
