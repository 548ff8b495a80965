use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::academic::check_references;
use super::auth::require_approved;
use crate::entity::{role, schedule, schedule_section, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::schedule::*;
use crate::models::shared::{PageQuery, Pagination};
use crate::policy::{self, Action, Target};
use crate::state::AppState;

async fn find_schedule<C: ConnectionTrait>(db: &C, id: i32) -> Result<schedule::Model, AppError> {
    schedule::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".into()))
}

/// The account a schedule names as its teacher must hold the teacher role.
async fn check_teacher<C: ConnectionTrait>(db: &C, teacher_id: i32) -> Result<(), AppError> {
    let account = user::Entity::find_by_id(teacher_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown teacher {teacher_id}")))?;
    if account.role != role::TEACHER {
        return Err(AppError::Validation(format!(
            "User {teacher_id} is not a teacher"
        )));
    }
    Ok(())
}

fn dedup(mut ids: Vec<i32>) -> Vec<i32> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn insert_sections<C: ConnectionTrait>(
    db: &C,
    schedule_id: i32,
    sections: &[i32],
) -> Result<(), AppError> {
    let rows = sections.iter().map(|&section_id| schedule_section::ActiveModel {
        schedule_id: Set(schedule_id),
        section_id: Set(section_id),
    });
    schedule_section::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Attach each schedule's sections and build the responses, in input order.
async fn with_sections<C: ConnectionTrait>(
    db: &C,
    schedules: Vec<schedule::Model>,
) -> Result<Vec<ScheduleResponse>, AppError> {
    let ids: Vec<i32> = schedules.iter().map(|s| s.id).collect();
    let mut by_schedule: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in schedule_section::Entity::find()
        .filter(schedule_section::Column::ScheduleId.is_in(ids))
        .all(db)
        .await?
    {
        by_schedule
            .entry(row.schedule_id)
            .or_default()
            .push(row.section_id);
    }

    let mut out = Vec::with_capacity(schedules.len());
    for m in schedules {
        let sections = by_schedule.remove(&m.id).unwrap_or_default();
        out.push(ScheduleResponse::new(m, sections)?);
    }
    Ok(out)
}

async fn schedule_response<C: ConnectionTrait>(
    db: &C,
    m: schedule::Model,
) -> Result<ScheduleResponse, AppError> {
    let mut responses = with_sections(db, vec![m]).await?;
    responses
        .pop()
        .ok_or_else(|| AppError::Internal("Schedule vanished while loading".into()))
}

fn slots_json(slots: &[common::TimeSlot]) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(slots).map_err(|e| AppError::Internal(e.to_string()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Schedules",
    operation_id = "createSchedule",
    summary = "Create a course schedule",
    description = "Requires `classroom:teach` permission. `teacher_id` defaults to the caller and must be a teacher account. Every section must exist.",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_schedule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::CreateSchedule, Target::none())?;
    validate_create_schedule(&payload)?;

    let sections = dedup(payload.sections);
    check_references(&state.db, None, &sections, None).await?;
    let teacher_id = payload.teacher_id.unwrap_or(auth_user.user_id);
    check_teacher(&state.db, teacher_id).await?;
    let time_slots = slots_json(&payload.time_slots)?;

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let model = schedule::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        course_code: Set(payload.course_code.trim().to_string()),
        course_title: Set(payload.course_title.trim().to_string()),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        time_slots: Set(time_slots),
        teacher_id: Set(teacher_id),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_sections(&txn, model.id, &sections).await?;
    txn.commit().await?;

    tracing::info!(schedule_id = model.id, "Created schedule");
    let response = ScheduleResponse::new(model, sections)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Schedules",
    operation_id = "listSchedules",
    summary = "List schedules",
    description = "Paginated, newest first. Requires an approved account.",
    params(ScheduleListQuery),
    responses(
        (status = 200, description = "Schedules", body = ScheduleListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_schedules(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ScheduleListQuery>,
) -> Result<Json<ScheduleListResponse>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;

    let (page, per_page) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut select = schedule::Entity::find();
    if let Some(teacher_id) = query.teacher_id {
        select = select.filter(schedule::Column::TeacherId.eq(teacher_id));
    }
    if let Some(section_id) = query.section_id {
        let attended: Vec<i32> = schedule_section::Entity::find()
            .filter(schedule_section::Column::SectionId.eq(section_id))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|row| row.schedule_id)
            .collect();
        select = select.filter(schedule::Column::Id.is_in(attended));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let models = select
        .order_by_desc(schedule::Column::CreatedAt)
        .order_by_desc(schedule::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    Ok(Json(ScheduleListResponse {
        data: with_sections(&state.db, models).await?,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/calendar",
    tag = "Schedules",
    operation_id = "scheduleCalendar",
    summary = "Schedules running within a date range",
    description = "Every schedule whose date range overlaps `[start, end]`, earliest first. Requires an approved account.",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Overlapping schedules", body = Vec<ScheduleResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn calendar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> Result<Json<Vec<ScheduleResponse>>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;
    validate_date_range(query.start, query.end)?;

    let mut select = schedule::Entity::find()
        .filter(schedule::Column::StartDate.lte(query.end))
        .filter(schedule::Column::EndDate.gte(query.start));
    if let Some(teacher_id) = query.teacher_id {
        select = select.filter(schedule::Column::TeacherId.eq(teacher_id));
    }
    let models = select
        .order_by_asc(schedule::Column::StartDate)
        .order_by_asc(schedule::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(with_sections(&state.db, models).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Schedules",
    operation_id = "getSchedule",
    summary = "A schedule",
    params(("id" = i32, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule", body = ScheduleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Schedule not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_schedule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ScheduleResponse>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;
    let model = find_schedule(&state.db, id).await?;
    Ok(Json(schedule_response(&state.db, model).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Schedules",
    operation_id = "updateSchedule",
    summary = "Update a schedule",
    description = "The schedule's creator or a holder of `schedule:moderate`. Only provided fields are changed; a provided `sections` list replaces the stored one.",
    params(("id" = i32, Path, description = "Schedule ID")),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = ScheduleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Schedule not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_schedule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let existing = find_schedule(&state.db, id).await?;
    policy::authorize(
        &auth_user,
        Action::EditSchedule,
        Target::owned_by(existing.created_by),
    )?;
    validate_update_schedule(&payload)?;

    if payload == UpdateScheduleRequest::default() {
        return Ok(Json(schedule_response(&state.db, existing).await?));
    }

    validate_date_range(
        payload.start_date.unwrap_or(existing.start_date),
        payload.end_date.unwrap_or(existing.end_date),
    )?;
    let sections = payload.sections.map(dedup);
    if let Some(sections) = &sections {
        check_references(&state.db, None, sections, None).await?;
    }
    if let Some(teacher_id) = payload.teacher_id {
        check_teacher(&state.db, teacher_id).await?;
    }

    let mut active: schedule::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(code) = payload.course_code {
        active.course_code = Set(code.trim().to_string());
    }
    if let Some(title) = payload.course_title {
        active.course_title = Set(title.trim().to_string());
    }
    if let Some(start) = payload.start_date {
        active.start_date = Set(start);
    }
    if let Some(end) = payload.end_date {
        active.end_date = Set(end);
    }
    if let Some(slots) = &payload.time_slots {
        active.time_slots = Set(slots_json(slots)?);
    }
    if let Some(teacher_id) = payload.teacher_id {
        active.teacher_id = Set(teacher_id);
    }
    active.updated_at = Set(Utc::now());

    let txn = state.db.begin().await?;
    let model = active.update(&txn).await?;
    if let Some(sections) = &sections {
        schedule_section::Entity::delete_many()
            .filter(schedule_section::Column::ScheduleId.eq(id))
            .exec(&txn)
            .await?;
        insert_sections(&txn, id, sections).await?;
    }
    let response = schedule_response(&txn, model).await?;
    txn.commit().await?;

    tracing::info!("Updated schedule");
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Schedules",
    operation_id = "deleteSchedule",
    summary = "Delete a schedule",
    description = "The schedule's creator or a holder of `schedule:moderate`.",
    params(("id" = i32, Path, description = "Schedule ID")),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Schedule not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_schedule(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_schedule(&state.db, id).await?;
    policy::authorize(
        &auth_user,
        Action::EditSchedule,
        Target::owned_by(existing.created_by),
    )?;

    let txn = state.db.begin().await?;
    schedule_section::Entity::delete_many()
        .filter(schedule_section::Column::ScheduleId.eq(id))
        .exec(&txn)
        .await?;
    let result = schedule::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound("Schedule not found".into()));
    }
    txn.commit().await?;

    tracing::info!(deleted_by = auth_user.user_id, "Deleted schedule");
    Ok(StatusCode::NO_CONTENT)
}
