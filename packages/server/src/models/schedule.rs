use chrono::{DateTime, Utc};
use common::TimeSlot;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_length};
use crate::entity::schedule;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateScheduleRequest {
    #[schema(example = "Data Structures, spring term")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = "CSE-231")]
    pub course_code: String,
    #[schema(example = "Data Structures")]
    pub course_title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub time_slots: Vec<TimeSlot>,
    /// Attending sections. At least one.
    pub sections: Vec<i32>,
    /// Teacher account giving the course. Defaults to the caller.
    pub teacher_id: Option<i32>,
}

/// Partial update. A provided `sections` list replaces the stored one.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateScheduleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub course_code: Option<String>,
    pub course_title: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub time_slots: Option<Vec<TimeSlot>>,
    pub sections: Option<Vec<i32>>,
    pub teacher_id: Option<i32>,
}

fn validate_time_slots(slots: &[TimeSlot]) -> Result<(), AppError> {
    if slots.is_empty() {
        return Err(AppError::Validation(
            "At least one time slot is required".into(),
        ));
    }
    if let Some(slot) = slots.iter().find(|s| !s.is_well_formed()) {
        return Err(AppError::Validation(format!(
            "Invalid time slot {}-{}: times are HH:MM and must not end before they start",
            slot.start_time, slot.end_time
        )));
    }
    for slot in slots {
        if let Some(room) = &slot.room {
            validate_length("Room", room, 0, 50)?;
        }
    }
    Ok(())
}

fn validate_sections(sections: &[i32]) -> Result<(), AppError> {
    if sections.is_empty() {
        return Err(AppError::Validation(
            "At least one section is required".into(),
        ));
    }
    Ok(())
}

pub fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::Validation(
            "Start date must not be after the end date".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_schedule(payload: &CreateScheduleRequest) -> Result<(), AppError> {
    validate_length("Title", &payload.title, 1, 150)?;
    validate_length("Description", &payload.description, 0, 1000)?;
    validate_length("Course code", &payload.course_code, 1, 10)?;
    validate_length("Course title", &payload.course_title, 1, 100)?;
    validate_date_range(payload.start_date, payload.end_date)?;
    validate_time_slots(&payload.time_slots)?;
    validate_sections(&payload.sections)
}

/// Field checks only. The merged date range is checked against the stored row.
pub fn validate_update_schedule(payload: &UpdateScheduleRequest) -> Result<(), AppError> {
    if let Some(title) = &payload.title {
        validate_length("Title", title, 1, 150)?;
    }
    if let Some(description) = &payload.description {
        validate_length("Description", description, 0, 1000)?;
    }
    if let Some(code) = &payload.course_code {
        validate_length("Course code", code, 1, 10)?;
    }
    if let Some(title) = &payload.course_title {
        validate_length("Course title", title, 1, 100)?;
    }
    if let Some(slots) = &payload.time_slots {
        validate_time_slots(slots)?;
    }
    if let Some(sections) = &payload.sections {
        validate_sections(sections)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScheduleResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub course_code: String,
    pub course_title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub time_slots: Vec<TimeSlot>,
    pub sections: Vec<i32>,
    pub teacher_id: i32,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleResponse {
    pub fn new(m: schedule::Model, mut sections: Vec<i32>) -> Result<Self, AppError> {
        let time_slots = serde_json::from_value(m.time_slots).map_err(|e| {
            AppError::Internal(format!(
                "Schedule {} has a corrupt time_slots column: {e}",
                m.id
            ))
        })?;
        sections.sort_unstable();
        Ok(Self {
            id: m.id,
            title: m.title,
            description: m.description,
            course_code: m.course_code,
            course_title: m.course_title,
            start_date: m.start_date,
            end_date: m.end_date,
            time_slots,
            sections,
            teacher_id: m.teacher_id,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub teacher_id: Option<i32>,
    /// Only schedules attended by this section.
    pub section_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScheduleListResponse {
    pub data: Vec<ScheduleResponse>,
    pub pagination: Pagination,
}

/// Schedules whose date range overlaps `[start, end]`.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub teacher_id: Option<i32>,
}
