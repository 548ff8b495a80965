use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::ResourceKind;
use sea_orm::*;
use tracing::instrument;

use super::room::touch_room;
use crate::entity::resource;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::resource::*;
use crate::policy::{self, Action, Target};
use crate::state::AppState;
use crate::utils::chat::file_name_from_url;
use crate::utils::room::{find_room, is_member};

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Resources",
    operation_id = "createResource",
    summary = "Share a file or link with a room",
    description = "File resources usually point at an earlier upload. Members only.",
    request_body = CreateResourceRequest,
    responses(
        (status = 201, description = "Resource shared", body = ResourceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(room_id = payload.room_id))]
pub async fn create_resource(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_resource(&payload)?;
    find_room(&state.db, payload.room_id).await?;
    let member = is_member(&state.db, payload.room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::ShareResource, Target::room(member))?;

    let (file_url, file_name, link_url) = match payload.kind {
        ResourceKind::File => {
            let url = trimmed(payload.file_url);
            let name = trimmed(payload.file_name)
                .or_else(|| url.as_deref().map(file_name_from_url));
            (url, name, None)
        }
        ResourceKind::Link => (None, None, trimmed(payload.link_url)),
    };

    let model = resource::ActiveModel {
        room_id: Set(payload.room_id),
        uploader_id: Set(auth_user.user_id),
        kind: Set(payload.kind),
        file_url: Set(file_url),
        file_name: Set(file_name),
        link_url: Set(link_url),
        description: Set(trimmed(payload.description).unwrap_or_default()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    touch_room(&state.db, model.room_id).await?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/rooms/{room_id}",
    tag = "Resources",
    operation_id = "listResources",
    summary = "Resources shared with a room",
    description = "Newest first. Members only.",
    params(("room_id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Resources", body = Vec<ResourceResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(room_id))]
pub async fn list_resources(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> Result<Json<Vec<ResourceResponse>>, AppError> {
    find_room(&state.db, room_id).await?;
    let member = is_member(&state.db, room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::ListResources, Target::room(member))?;

    let rows = resource::Entity::find()
        .filter(resource::Column::RoomId.eq(room_id))
        .order_by_desc(resource::Column::CreatedAt)
        .order_by_desc(resource::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Resources",
    operation_id = "deleteResource",
    summary = "Remove a shared resource",
    description = "Only the uploader or a holder of `resource:moderate`. Uploaded bytes are kept.",
    params(("id" = i32, Path, description = "Resource ID")),
    responses(
        (status = 204, description = "Resource removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Resource not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_resource(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = resource::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".into()))?;
    policy::authorize(
        &auth_user,
        Action::DeleteResource,
        Target::owned_by(existing.uploader_id),
    )?;

    resource::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
