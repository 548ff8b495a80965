use chrono::{DateTime, Utc};
use common::CourseworkKind;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_length};
use crate::entity::coursework;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCourseworkRequest {
    /// Defaults to `assignment`.
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: CourseworkKind,
    #[schema(example = "CSE-231")]
    pub course_code: String,
    #[schema(example = "Data Structures")]
    pub course_title: String,
    #[schema(example = "Balanced trees")]
    pub title: String,
    pub detail: String,
    pub due_date: Option<DateTime<Utc>>,
    pub intake_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
}

/// Partial update. Audience references cannot be cleared once set.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCourseworkRequest {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<CourseworkKind>,
    pub course_code: Option<String>,
    pub course_title: Option<String>,
    pub title: Option<String>,
    pub detail: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub intake_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
}

pub fn validate_create_coursework(payload: &CreateCourseworkRequest) -> Result<(), AppError> {
    validate_length("Course code", &payload.course_code, 1, 8)?;
    validate_length("Course title", &payload.course_title, 1, 100)?;
    validate_length("Title", &payload.title, 1, 150)?;
    validate_length("Detail", &payload.detail, 1, 10_000)
}

pub fn validate_update_coursework(payload: &UpdateCourseworkRequest) -> Result<(), AppError> {
    if let Some(code) = &payload.course_code {
        validate_length("Course code", code, 1, 8)?;
    }
    if let Some(title) = &payload.course_title {
        validate_length("Course title", title, 1, 100)?;
    }
    if let Some(title) = &payload.title {
        validate_length("Title", title, 1, 150)?;
    }
    if let Some(detail) = &payload.detail {
        validate_length("Detail", detail, 1, 10_000)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseworkResponse {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: CourseworkKind,
    pub course_code: String,
    pub course_title: String,
    pub title: String,
    pub detail: String,
    pub due_date: Option<DateTime<Utc>>,
    pub intake_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<coursework::Model> for CourseworkResponse {
    fn from(m: coursework::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            course_code: m.course_code,
            course_title: m.course_title,
            title: m.title,
            detail: m.detail,
            due_date: m.due_date,
            intake_id: m.intake_id,
            department_id: m.department_id,
            section_id: m.section_id,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseworkListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub intake_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
    #[serde(rename = "type")]
    pub kind: Option<CourseworkKind>,
    /// Case-insensitive substring of the course code.
    pub course_code: Option<String>,
    /// Only coursework due from now on.
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseworkListResponse {
    pub data: Vec<CourseworkResponse>,
    pub pagination: Pagination,
}

/// The cohort whose coursework is grouped by kind.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CohortQuery {
    pub intake_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
}

impl CohortQuery {
    /// All three references are required.
    pub fn require(&self) -> Result<(i32, i32, i32), AppError> {
        match (self.intake_id, self.department_id, self.section_id) {
            (Some(intake), Some(department), Some(section)) => Ok((intake, department, section)),
            _ => Err(AppError::Validation(
                "intake_id, department_id and section_id are required".into(),
            )),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseworkGroup {
    #[serde(rename = "type")]
    pub kind: CourseworkKind,
    pub count: usize,
    pub items: Vec<CourseworkResponse>,
}

/// Group coursework by kind, kinds in a stable order, items in input order.
pub fn group_by_kind(items: Vec<coursework::Model>) -> Vec<CourseworkGroup> {
    let mut groups: Vec<CourseworkGroup> = Vec::new();
    for m in items {
        match groups.iter_mut().find(|g| g.kind == m.kind) {
            Some(group) => group.items.push(m.into()),
            None => groups.push(CourseworkGroup {
                kind: m.kind,
                count: 0,
                items: vec![m.into()],
            }),
        }
    }
    groups.sort_by_key(|g| g.kind);
    for group in &mut groups {
        group.count = group.items.len();
    }
    groups
}
