use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{class_routine, department, intake, section};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::academic::*;
use crate::policy::{self, Action, Target};
use crate::state::AppState;

/// Map a unique-index violation to a 409 with `what` in the message.
fn conflict_on_duplicate(what: &'static str) -> impl FnOnce(DbErr) -> AppError {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{what} already exists"))
        }
        _ => AppError::from(e),
    }
}

fn trimmed_or_empty(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

async fn find_department<C: ConnectionTrait>(db: &C, id: i32) -> Result<department::Model, AppError> {
    department::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".into()))
}

async fn find_section<C: ConnectionTrait>(db: &C, id: i32) -> Result<section::Model, AppError> {
    section::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Section not found".into()))
}

async fn find_intake<C: ConnectionTrait>(db: &C, id: i32) -> Result<intake::Model, AppError> {
    intake::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Intake not found".into()))
}

async fn find_routine<C: ConnectionTrait>(db: &C, id: i32) -> Result<class_routine::Model, AppError> {
    class_routine::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Routine entry not found".into()))
}

/// Reject references to departments, sections or intakes that do not exist.
pub async fn check_references<C: ConnectionTrait>(
    db: &C,
    department_id: Option<i32>,
    section_ids: &[i32],
    intake_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(id) = department_id
        && department::Entity::find_by_id(id).one(db).await?.is_none()
    {
        return Err(AppError::Validation(format!("Unknown department {id}")));
    }
    if !section_ids.is_empty() {
        let mut wanted = section_ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();
        let found = section::Entity::find()
            .filter(section::Column::Id.is_in(wanted.clone()))
            .count(db)
            .await?;
        if found != wanted.len() as u64 {
            return Err(AppError::Validation("Unknown section".into()));
        }
    }
    if let Some(id) = intake_id
        && intake::Entity::find_by_id(id).one(db).await?.is_none()
    {
        return Err(AppError::Validation(format!("Unknown intake {id}")));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/departments",
    tag = "Academic",
    operation_id = "listDepartments",
    summary = "List departments",
    responses(
        (status = 200, description = "Departments ordered by code", body = Vec<DepartmentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_departments(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentResponse>>, AppError> {
    let rows = department::Entity::find()
        .order_by_asc(department::Column::Code)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/departments",
    tag = "Academic",
    operation_id = "createDepartment",
    summary = "Create a department",
    description = "Requires `academic:manage` permission. The code is stored uppercased and must be unique.",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Duplicate code (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_department(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_create_department(&payload)?;

    let model = department::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        code: Set(payload.code.trim().to_uppercase()),
        description: Set(trimmed_or_empty(payload.description)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(conflict_on_duplicate("Department code"))?;

    Ok((StatusCode::CREATED, Json(DepartmentResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/departments/{id}",
    tag = "Academic",
    operation_id = "updateDepartment",
    summary = "Update a department",
    description = "Requires `academic:manage` permission. Only provided fields are changed.",
    params(("id" = i32, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = DepartmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Department not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate code (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_department(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateDepartmentRequest>,
) -> Result<Json<DepartmentResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_update_department(&payload)?;

    let existing = find_department(&state.db, id).await?;
    if payload == UpdateDepartmentRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: department::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(code) = payload.code {
        active.code = Set(code.trim().to_uppercase());
    }
    if let Some(desc) = payload.description {
        active.description = Set(desc.trim().to_string());
    }

    let model = active
        .update(&state.db)
        .await
        .map_err(conflict_on_duplicate("Department code"))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/departments/{id}",
    tag = "Academic",
    operation_id = "deleteDepartment",
    summary = "Delete a department",
    description = "Requires `academic:manage` permission.",
    params(("id" = i32, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Department not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_department(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;

    let result = department::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Department not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/sections",
    tag = "Academic",
    operation_id = "listSections",
    summary = "List sections",
    responses(
        (status = 200, description = "Sections ordered by label", body = Vec<SectionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_sections(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SectionResponse>>, AppError> {
    let rows = section::Entity::find()
        .order_by_asc(section::Column::Section)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/sections",
    tag = "Academic",
    operation_id = "createSection",
    summary = "Create a section",
    description = "Requires `academic:manage` permission.",
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section created", body = SectionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_section(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_create_section(&payload)?;

    let model = section::ActiveModel {
        section: Set(payload.section.trim().to_string()),
        description: Set(trimmed_or_empty(payload.description)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(SectionResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/sections/{id}",
    tag = "Academic",
    operation_id = "updateSection",
    summary = "Update a section",
    description = "Requires `academic:manage` permission. Only provided fields are changed.",
    params(("id" = i32, Path, description = "Section ID")),
    request_body = UpdateSectionRequest,
    responses(
        (status = 200, description = "Section updated", body = SectionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Section not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_section(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSectionRequest>,
) -> Result<Json<SectionResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_update_section(&payload)?;

    let existing = find_section(&state.db, id).await?;
    if payload == UpdateSectionRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: section::ActiveModel = existing.into();
    if let Some(label) = payload.section {
        active.section = Set(label.trim().to_string());
    }
    if let Some(desc) = payload.description {
        active.description = Set(desc.trim().to_string());
    }

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/sections/{id}",
    tag = "Academic",
    operation_id = "deleteSection",
    summary = "Delete a section",
    description = "Requires `academic:manage` permission.",
    params(("id" = i32, Path, description = "Section ID")),
    responses(
        (status = 204, description = "Section deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Section not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_section(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;

    let result = section::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Section not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/intakes",
    tag = "Academic",
    operation_id = "listIntakes",
    summary = "List intakes",
    responses(
        (status = 200, description = "Intakes, newest first", body = Vec<IntakeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_intakes(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<IntakeResponse>>, AppError> {
    let rows = intake::Entity::find()
        .order_by_desc(intake::Column::Intake)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/intakes",
    tag = "Academic",
    operation_id = "createIntake",
    summary = "Create an intake",
    description = "Requires `academic:manage` permission. Intake numbers are unique.",
    request_body = IntakeRequest,
    responses(
        (status = 201, description = "Intake created", body = IntakeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Duplicate intake (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_intake(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<IntakeRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_intake(&payload)?;

    let model = intake::ActiveModel {
        intake: Set(payload.intake),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(conflict_on_duplicate("Intake"))?;

    Ok((StatusCode::CREATED, Json(IntakeResponse::from(model))))
}

#[utoipa::path(
    put,
    path = "/intakes/{id}",
    tag = "Academic",
    operation_id = "updateIntake",
    summary = "Renumber an intake",
    description = "Requires `academic:manage` permission.",
    params(("id" = i32, Path, description = "Intake ID")),
    request_body = IntakeRequest,
    responses(
        (status = 200, description = "Intake updated", body = IntakeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Intake not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate intake (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_intake(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<IntakeRequest>,
) -> Result<Json<IntakeResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_intake(&payload)?;

    let existing = find_intake(&state.db, id).await?;
    if existing.intake == payload.intake {
        return Ok(Json(existing.into()));
    }

    let mut active: intake::ActiveModel = existing.into();
    active.intake = Set(payload.intake);
    let model = active
        .update(&state.db)
        .await
        .map_err(conflict_on_duplicate("Intake"))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/intakes/{id}",
    tag = "Academic",
    operation_id = "deleteIntake",
    summary = "Delete an intake",
    description = "Requires `academic:manage` permission.",
    params(("id" = i32, Path, description = "Intake ID")),
    responses(
        (status = 204, description = "Intake deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Intake not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_intake(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;

    let result = intake::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Intake not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/routines",
    tag = "Academic",
    operation_id = "listRoutines",
    summary = "Weekly class routine",
    description = "Ordered by day (Saturday first) and period.",
    params(RoutineQuery),
    responses(
        (status = 200, description = "Routine entries", body = Vec<RoutineResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_routines(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RoutineQuery>,
) -> Result<Json<Vec<RoutineResponse>>, AppError> {
    let mut select = class_routine::Entity::find();
    if let Some(id) = query.department_id {
        select = select.filter(class_routine::Column::DepartmentId.eq(id));
    }
    if let Some(id) = query.section_id {
        select = select.filter(class_routine::Column::SectionId.eq(id));
    }
    if let Some(id) = query.intake_id {
        select = select.filter(class_routine::Column::IntakeId.eq(id));
    }
    if let Some(day) = query.day {
        select = select.filter(class_routine::Column::Day.eq(day));
    }

    let mut rows = select.all(&state.db).await?;
    rows.sort_by_key(|r| (r.day.position(), r.period.position(), r.id));
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/routines",
    tag = "Academic",
    operation_id = "createRoutine",
    summary = "Add a class to the routine",
    description = "Requires `academic:manage` permission. A section holds one class per day and period.",
    request_body = CreateRoutineRequest,
    responses(
        (status = 201, description = "Routine entry created", body = RoutineResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Period already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_routine(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRoutineRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_create_routine(&payload)?;
    check_references(
        &state.db,
        Some(payload.department_id),
        &[payload.section_id],
        payload.intake_id,
    )
    .await?;

    let model = class_routine::ActiveModel {
        day: Set(payload.day),
        period: Set(payload.period),
        course_code: Set(payload.course_code.trim().to_uppercase()),
        faculty_short_name: Set(payload.faculty_short_name.trim().to_uppercase()),
        building: Set(payload.building),
        room: Set(payload.room),
        intake_id: Set(payload.intake_id),
        department_id: Set(payload.department_id),
        section_id: Set(payload.section_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(conflict_on_duplicate("A class in this period"))?;

    Ok((StatusCode::CREATED, Json(RoutineResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/routines/{id}",
    tag = "Academic",
    operation_id = "updateRoutine",
    summary = "Update a routine entry",
    description = "Requires `academic:manage` permission. Only provided fields are changed.",
    params(("id" = i32, Path, description = "Routine entry ID")),
    request_body = UpdateRoutineRequest,
    responses(
        (status = 200, description = "Routine entry updated", body = RoutineResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Routine entry not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Period already taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_routine(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRoutineRequest>,
) -> Result<Json<RoutineResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;
    validate_update_routine(&payload)?;

    let existing = find_routine(&state.db, id).await?;
    if payload == UpdateRoutineRequest::default() {
        return Ok(Json(existing.into()));
    }
    let sections: Vec<i32> = payload.section_id.into_iter().collect();
    check_references(&state.db, payload.department_id, &sections, payload.intake_id).await?;

    let mut active: class_routine::ActiveModel = existing.into();
    if let Some(day) = payload.day {
        active.day = Set(day);
    }
    if let Some(period) = payload.period {
        active.period = Set(period);
    }
    if let Some(code) = payload.course_code {
        active.course_code = Set(code.trim().to_uppercase());
    }
    if let Some(name) = payload.faculty_short_name {
        active.faculty_short_name = Set(name.trim().to_uppercase());
    }
    if let Some(building) = payload.building {
        active.building = Set(building);
    }
    if let Some(room) = payload.room {
        active.room = Set(room);
    }
    if let Some(intake_id) = payload.intake_id {
        active.intake_id = Set(Some(intake_id));
    }
    if let Some(department_id) = payload.department_id {
        active.department_id = Set(department_id);
    }
    if let Some(section_id) = payload.section_id {
        active.section_id = Set(section_id);
    }

    let model = active
        .update(&state.db)
        .await
        .map_err(conflict_on_duplicate("A class in this period"))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/routines/{id}",
    tag = "Academic",
    operation_id = "deleteRoutine",
    summary = "Remove a class from the routine",
    description = "Requires `academic:manage` permission.",
    params(("id" = i32, Path, description = "Routine entry ID")),
    responses(
        (status = 204, description = "Routine entry deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Routine entry not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_routine(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageAcademic, Target::none())?;

    let result = class_routine::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Routine entry not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
