use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use super::auth::find_user;
use crate::entity::{role, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::auth::UserResponse;
use crate::models::shared::{PageQuery, Pagination, escape_like};
use crate::models::user::{UpdateUserRequest, UserListQuery, UserListResponse, validate_update_user};
use crate::policy::{self, Action, Target};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List accounts",
    description = "Paginated, newest first. Requires `user:manage` permission.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Accounts", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageUsers, Target::none())?;

    let (page, per_page) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut select = user::Entity::find();
    if let Some(r) = query.role.as_deref() {
        select = select.filter(user::Column::Role.eq(r));
    }
    if let Some(approved) = query.is_approved {
        select = select.filter(user::Column::IsApproved.eq(approved));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::FullName)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "Users",
    operation_id = "approveUser",
    summary = "Approve a pending account",
    description = "Lets a student join rooms by code. Idempotent. Requires `user:manage` permission.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Approved account", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn approve_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageUsers, Target::none())?;

    let existing = find_user(&state.db, id).await?;
    if existing.is_approved {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();
    active.is_approved = Set(true);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    tracing::info!(approved_by = auth_user.user_id, "Approved account");
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Change an account's role or active flag",
    description = "Requires `user:manage` permission. Promoting to teacher or admin also approves the account. Administrators cannot deactivate or demote themselves.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageUsers, Target::none())?;
    validate_update_user(&payload)?;

    if id == auth_user.user_id
        && (payload.is_active == Some(false)
            || payload.role.as_deref().is_some_and(|r| r != auth_user.role))
    {
        return Err(AppError::Validation(
            "You cannot deactivate or change the role of your own account".into(),
        ));
    }

    let existing = find_user(&state.db, id).await?;
    if payload == UpdateUserRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(new_role) = payload.role {
        if new_role != role::STUDENT {
            active.is_approved = Set(true);
        }
        active.role = Set(new_role);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}
