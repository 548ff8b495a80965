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
use super::auth::{find_user, require_approved};
use crate::entity::{student, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::auth::UserResponse;
use crate::models::shared::{PageQuery, Pagination};
use crate::models::student::*;
use crate::policy::{self, Action, Target};
use crate::state::AppState;

/// Unique personal IDs and one profile per account are both unique columns.
fn student_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("user_id") => {
            AppError::Conflict("This account already has a student profile".into())
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A student with this personal ID already exists".into())
        }
        _ => AppError::from(e),
    }
}

async fn find_student<C: ConnectionTrait>(db: &C, id: i32) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

async fn find_own_student<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<student::Model, AppError> {
    student::Entity::find()
        .filter(student::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student profile not found".into()))
}

/// Apply a partial update. Only `student:manage` may set `is_class_cr`.
async fn apply_update(
    state: &AppState,
    auth_user: &AuthUser,
    existing: student::Model,
    payload: UpdateStudentRequest,
) -> Result<student::Model, AppError> {
    validate_update_student(&payload)?;
    if payload.is_class_cr.is_some()
        && !policy::is_allowed(auth_user, Action::ManageStudents, Target::none())
    {
        return Err(AppError::PermissionDenied);
    }
    if payload == UpdateStudentRequest::default() {
        return Ok(existing);
    }
    let sections: Vec<i32> = payload.section_id.into_iter().collect();
    check_references(&state.db, payload.department_id, &sections, payload.intake_id).await?;

    let mut active: student::ActiveModel = existing.into();
    if let Some(personal_id) = payload.personal_id {
        active.personal_id = Set(personal_id.trim().to_string());
    }
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(gender) = payload.gender {
        active.gender = Set(gender);
    }
    if let Some(intake_id) = payload.intake_id {
        active.intake_id = Set(Some(intake_id));
    }
    if let Some(section_id) = payload.section_id {
        active.section_id = Set(section_id);
    }
    if let Some(department_id) = payload.department_id {
        active.department_id = Set(department_id);
    }
    if let Some(shift) = payload.shift {
        active.shift = Set(shift);
    }
    if payload.image.is_some() {
        active.image = Set(non_blank(payload.image));
    }
    if payload.contact_number.is_some() {
        active.contact_number = Set(non_blank(payload.contact_number));
    }
    if payload.facebook_profile.is_some() {
        active.facebook_profile = Set(non_blank(payload.facebook_profile));
    }
    if let Some(is_cr) = payload.is_class_cr {
        active.is_class_cr = Set(is_cr);
    }
    active.updated_at = Set(Utc::now());

    active.update(&state.db).await.map_err(student_conflict)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Students",
    operation_id = "createStudent",
    summary = "Fill in the caller's student profile",
    description = "Requires `student:profile` permission. One profile per account; personal IDs are unique. Marks the account's details as filled.",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Profile created", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Profile or personal ID exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::FillStudentProfile, Target::none())?;
    validate_create_student(&payload)?;
    check_references(
        &state.db,
        Some(payload.department_id),
        &[payload.section_id],
        payload.intake_id,
    )
    .await?;

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let inserted = student::ActiveModel {
        user_id: Set(auth_user.user_id),
        personal_id: Set(payload.personal_id.trim().to_string()),
        name: Set(payload.name.trim().to_string()),
        gender: Set(payload.gender),
        image: Set(non_blank(payload.image)),
        intake_id: Set(payload.intake_id),
        section_id: Set(payload.section_id),
        department_id: Set(payload.department_id),
        shift: Set(payload.shift),
        is_class_cr: Set(false),
        contact_number: Set(non_blank(payload.contact_number)),
        facebook_profile: Set(non_blank(payload.facebook_profile)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await;
    let model = match inserted {
        Ok(model) => model,
        Err(e) => {
            txn.rollback().await?;
            return Err(student_conflict(e));
        }
    };

    user::Entity::update_many()
        .col_expr(user::Column::DetailsFilled, sea_orm::sea_query::Expr::value(true))
        .col_expr(user::Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
        .filter(user::Column::Id.eq(auth_user.user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(student_id = model.id, "Created student profile");
    Ok((StatusCode::CREATED, Json(StudentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List student profiles",
    description = "Paginated, newest first. Requires an approved account.",
    params(StudentListQuery),
    responses(
        (status = 200, description = "Student profiles", body = StudentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<StudentListQuery>,
) -> Result<Json<StudentListResponse>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;

    let (page, per_page) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut select = student::Entity::find();
    if let Some(id) = query.intake_id {
        select = select.filter(student::Column::IntakeId.eq(id));
    }
    if let Some(id) = query.section_id {
        select = select.filter(student::Column::SectionId.eq(id));
    }
    if let Some(id) = query.department_id {
        select = select.filter(student::Column::DepartmentId.eq(id));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_desc(student::Column::CreatedAt)
        .order_by_desc(student::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(StudentResponse::from)
        .collect();

    Ok(Json(StudentListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Students",
    operation_id = "getMyStudentProfile",
    summary = "The caller's student profile",
    responses(
        (status = 200, description = "Profile", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No profile yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StudentResponse>, AppError> {
    policy::authorize(&auth_user, Action::FillStudentProfile, Target::none())?;
    let model = find_own_student(&state.db, auth_user.user_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/me",
    tag = "Students",
    operation_id = "updateMyStudentProfile",
    summary = "Update the caller's student profile",
    description = "Only provided fields are changed.",
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Profile updated", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No profile yet (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Personal ID in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_my_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    policy::authorize(&auth_user, Action::FillStudentProfile, Target::none())?;
    let existing = find_own_student(&state.db, auth_user.user_id).await?;
    let model = apply_update(&state, &auth_user, existing, payload).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Students",
    operation_id = "getStudent",
    summary = "A student profile",
    description = "Requires an approved account.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Profile", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudentResponse>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;
    Ok(Json(find_student(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Students",
    operation_id = "updateStudent",
    summary = "Update a student profile",
    description = "The profile's owner or a holder of `student:manage`. Only provided fields are changed.",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Profile updated", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Personal ID in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    let existing = find_student(&state.db, id).await?;
    policy::authorize(
        &auth_user,
        Action::UpdateStudent,
        Target::owned_by(existing.user_id),
    )?;
    let model = apply_update(&state, &auth_user, existing, payload).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Delete a student profile",
    description = "Requires `student:manage` permission. The account stays; its details are marked unfilled.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageStudents, Target::none())?;

    let existing = find_student(&state.db, id).await?;
    let txn = state.db.begin().await?;
    student::Entity::delete_by_id(id).exec(&txn).await?;
    user::Entity::update_many()
        .col_expr(user::Column::DetailsFilled, sea_orm::sea_query::Expr::value(false))
        .filter(user::Column::Id.eq(existing.user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(deleted_by = auth_user.user_id, "Deleted student profile");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "Students",
    operation_id = "approveStudent",
    summary = "Approve the account behind a student profile",
    description = "Requires `student:manage` permission. Idempotent.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Approved account", body = UserResponse),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn approve_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageStudents, Target::none())?;

    let profile = find_student(&state.db, id).await?;
    let account = find_user(&state.db, profile.user_id).await?;
    if account.is_approved {
        return Ok(Json(account.into()));
    }

    let mut active: user::ActiveModel = account.into();
    active.is_approved = Set(true);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    tracing::info!(approved_by = auth_user.user_id, user_id = model.id, "Approved student");
    Ok(Json(model.into()))
}
