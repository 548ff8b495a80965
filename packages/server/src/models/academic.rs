use chrono::{DateTime, Utc};
use common::{ClassPeriod, RoutineDay};
use serde::{Deserialize, Serialize};

use super::shared::validate_length;
use crate::entity::{class_routine, department, intake, section};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDepartmentRequest {
    #[schema(example = "Computer Science and Engineering")]
    pub name: String,
    /// Short code, stored uppercased.
    #[schema(example = "CSE")]
    pub code: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

fn validate_department_code(code: &str) -> Result<(), AppError> {
    validate_length("Code", code, 1, 10)?;
    if !code.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "Code must contain only letters and digits".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_department(payload: &CreateDepartmentRequest) -> Result<(), AppError> {
    validate_length("Name", &payload.name, 1, 120)?;
    validate_department_code(&payload.code)?;
    if let Some(desc) = &payload.description {
        validate_length("Description", desc, 0, 500)?;
    }
    Ok(())
}

pub fn validate_update_department(payload: &UpdateDepartmentRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_length("Name", name, 1, 120)?;
    }
    if let Some(code) = &payload.code {
        validate_department_code(code)?;
    }
    if let Some(desc) = &payload.description {
        validate_length("Description", desc, 0, 500)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DepartmentResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<department::Model> for DepartmentResponse {
    fn from(m: department::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            code: m.code,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSectionRequest {
    /// Section label (1-5 characters).
    #[schema(example = "A")]
    pub section: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSectionRequest {
    pub section: Option<String>,
    pub description: Option<String>,
}

pub fn validate_create_section(payload: &CreateSectionRequest) -> Result<(), AppError> {
    validate_length("Section", &payload.section, 1, 5)?;
    if let Some(desc) = &payload.description {
        validate_length("Description", desc, 0, 500)?;
    }
    Ok(())
}

pub fn validate_update_section(payload: &UpdateSectionRequest) -> Result<(), AppError> {
    if let Some(section) = &payload.section {
        validate_length("Section", section, 1, 5)?;
    }
    if let Some(desc) = &payload.description {
        validate_length("Description", desc, 0, 500)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SectionResponse {
    pub id: i32,
    pub section: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<section::Model> for SectionResponse {
    fn from(m: section::Model) -> Self {
        Self {
            id: m.id,
            section: m.section,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct IntakeRequest {
    /// Intake number, at least 1.
    #[schema(example = 49)]
    pub intake: i32,
}

pub fn validate_intake(payload: &IntakeRequest) -> Result<(), AppError> {
    if payload.intake < 1 {
        return Err(AppError::Validation("Intake must be >= 1".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct IntakeResponse {
    pub id: i32,
    pub intake: i32,
    pub created_at: DateTime<Utc>,
}

impl From<intake::Model> for IntakeResponse {
    fn from(m: intake::Model) -> Self {
        Self {
            id: m.id,
            intake: m.intake,
            created_at: m.created_at,
        }
    }
}

/// One class in a section's weekly routine.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRoutineRequest {
    pub day: RoutineDay,
    #[serde(alias = "time")]
    pub period: ClassPeriod,
    /// Stored uppercased.
    #[schema(example = "CSE331")]
    pub course_code: String,
    #[schema(example = "FI")]
    pub faculty_short_name: String,
    #[schema(example = 2)]
    pub building: i32,
    #[schema(example = 501)]
    pub room: i32,
    pub intake_id: Option<i32>,
    pub department_id: i32,
    pub section_id: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateRoutineRequest {
    pub day: Option<RoutineDay>,
    #[serde(alias = "time")]
    pub period: Option<ClassPeriod>,
    pub course_code: Option<String>,
    pub faculty_short_name: Option<String>,
    pub building: Option<i32>,
    pub room: Option<i32>,
    pub intake_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
}

fn validate_routine_fields(
    course_code: Option<&str>,
    faculty_short_name: Option<&str>,
    building: Option<i32>,
    room: Option<i32>,
) -> Result<(), AppError> {
    if let Some(code) = course_code {
        validate_length("Course code", code, 1, 8)?;
    }
    if let Some(name) = faculty_short_name {
        validate_length("Faculty short name", name, 1, 5)?;
    }
    if building.is_some_and(|b| b < 1) {
        return Err(AppError::Validation("Building must be >= 1".into()));
    }
    if room.is_some_and(|r| r < 1) {
        return Err(AppError::Validation("Room must be >= 1".into()));
    }
    Ok(())
}

pub fn validate_create_routine(payload: &CreateRoutineRequest) -> Result<(), AppError> {
    validate_routine_fields(
        Some(&payload.course_code),
        Some(&payload.faculty_short_name),
        Some(payload.building),
        Some(payload.room),
    )
}

pub fn validate_update_routine(payload: &UpdateRoutineRequest) -> Result<(), AppError> {
    validate_routine_fields(
        payload.course_code.as_deref(),
        payload.faculty_short_name.as_deref(),
        payload.building,
        payload.room,
    )
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoutineQuery {
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
    pub intake_id: Option<i32>,
    pub day: Option<RoutineDay>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoutineResponse {
    pub id: i32,
    pub day: RoutineDay,
    pub period: ClassPeriod,
    pub course_code: String,
    pub faculty_short_name: String,
    pub building: i32,
    pub room: i32,
    pub intake_id: Option<i32>,
    pub department_id: i32,
    pub section_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<class_routine::Model> for RoutineResponse {
    fn from(m: class_routine::Model) -> Self {
        Self {
            id: m.id,
            day: m.day,
            period: m.period,
            course_code: m.course_code,
            faculty_short_name: m.faculty_short_name,
            building: m.building,
            room: m.room,
            intake_id: m.intake_id,
            department_id: m.department_id,
            section_id: m.section_id,
            created_at: m.created_at,
        }
    }
}
