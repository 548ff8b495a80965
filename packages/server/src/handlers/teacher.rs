use std::collections::HashMap;

use axum::{Json, extract::State};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::academic::check_references;
use crate::entity::{role, teacher, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::student::non_blank;
use crate::models::teacher::*;
use crate::policy::{self, Action, Target};
use crate::state::AppState;

async fn find_own_teacher<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<teacher::Model>, AppError> {
    Ok(teacher::Entity::find()
        .filter(teacher::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Teachers",
    operation_id = "getMyTeacherProfile",
    summary = "The caller's teacher profile",
    responses(
        (status = 200, description = "Profile", body = TeacherProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No profile yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_teacher(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TeacherProfileResponse>, AppError> {
    policy::authorize(&auth_user, Action::FillTeacherProfile, Target::none())?;
    find_own_teacher(&state.db, auth_user.user_id)
        .await?
        .map(|m| Json(m.into()))
        .ok_or_else(|| AppError::NotFound("Teacher profile not found".into()))
}

#[utoipa::path(
    put,
    path = "/me",
    tag = "Teachers",
    operation_id = "upsertMyTeacherProfile",
    summary = "Create or replace the caller's teacher profile",
    description = "Requires `teacher:profile` permission. Marks the account's details as filled.",
    request_body = UpsertTeacherRequest,
    responses(
        (status = 200, description = "Profile saved", body = TeacherProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Personal ID in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn upsert_my_teacher(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpsertTeacherRequest>,
) -> Result<Json<TeacherProfileResponse>, AppError> {
    policy::authorize(&auth_user, Action::FillTeacherProfile, Target::none())?;
    validate_upsert_teacher(&payload)?;
    check_references(&state.db, Some(payload.department_id), &[], None).await?;

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let existing = find_own_teacher(&txn, auth_user.user_id).await?;
    let mut active = match existing {
        Some(m) => m.into(),
        None => teacher::ActiveModel {
            user_id: Set(auth_user.user_id),
            created_at: Set(now),
            ..Default::default()
        },
    };
    active.personal_id = Set(payload.personal_id.trim().to_string());
    active.name = Set(payload.name.trim().to_string());
    active.gender = Set(payload.gender);
    active.image = Set(non_blank(payload.image));
    active.department_id = Set(payload.department_id);
    active.is_intake_incharge = Set(payload.is_intake_incharge);
    active.updated_at = Set(now);

    let saved = match active.save(&txn).await {
        Ok(saved) => saved,
        Err(e) => {
            txn.rollback().await?;
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
                    "A teacher with this personal ID already exists".into(),
                ),
                _ => AppError::from(e),
            });
        }
    };
    let model = saved.try_into_model()?;

    user::Entity::update_many()
        .col_expr(user::Column::DetailsFilled, sea_orm::sea_query::Expr::value(true))
        .col_expr(user::Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
        .filter(user::Column::Id.eq(auth_user.user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(teacher_id = model.id, "Saved teacher profile");
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/teachers",
    tag = "Users",
    operation_id = "listTeachers",
    summary = "List active teacher accounts",
    description = "Any authenticated user. Each entry carries the teacher profile when one is filled in.",
    responses(
        (status = 200, description = "Teachers ordered by name", body = Vec<TeacherSummary>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_teachers(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherSummary>>, AppError> {
    let accounts = user::Entity::find()
        .filter(user::Column::Role.eq(role::TEACHER))
        .filter(user::Column::IsActive.eq(true))
        .all(&state.db)
        .await?;
    let ids: Vec<i32> = accounts.iter().map(|u| u.id).collect();
    let mut profiles: HashMap<i32, teacher::Model> = teacher::Entity::find()
        .filter(teacher::Column::UserId.is_in(ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();

    let mut teachers: Vec<TeacherSummary> = accounts
        .into_iter()
        .map(|account| {
            let profile = profiles.remove(&account.id);
            TeacherSummary::new(account, profile)
        })
        .collect();
    teachers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(Json(teachers))
}
