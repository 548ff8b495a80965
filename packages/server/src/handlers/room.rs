use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::auth::require_approved;
use crate::entity::{room, room_member, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::room::*;
use crate::policy::{self, Action, Target};
use crate::state::AppState;
use crate::utils::room::{find_room, generate_code, is_member, normalize_code};

/// Attempts at drawing an unused join code before giving up.
const CODE_ATTEMPTS: usize = 8;

#[utoipa::path(
    post,
    path = "/",
    tag = "Rooms",
    operation_id = "createRoom",
    summary = "Create a room",
    description = "Generates a unique six-character join code and enrolls the creator. Requires `room:create` permission.",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_room(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::CreateRoom, Target::none())?;
    validate_create_room(&payload)?;

    let title = payload.title.trim().to_string();
    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    for attempt in 1..=CODE_ATTEMPTS {
        let now = Utc::now();
        let txn = state.db.begin().await?;

        let inserted = room::ActiveModel {
            title: Set(title.clone()),
            description: Set(description.clone()),
            code: Set(generate_code()),
            owner_id: Set(auth_user.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await;

        let model = match inserted {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(attempt, "Join code collision, retrying");
                txn.rollback().await?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        room_member::ActiveModel {
            room_id: Set(model.id),
            user_id: Set(auth_user.user_id),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!(room_id = model.id, code = %model.code, "Created room");
        return Ok((StatusCode::CREATED, Json(RoomResponse::from(model))));
    }

    Err(AppError::Internal(format!(
        "No free join code after {CODE_ATTEMPTS} attempts"
    )))
}

#[utoipa::path(
    post,
    path = "/join",
    tag = "Rooms",
    operation_id = "joinRoom",
    summary = "Join a room by code",
    description = "Codes are case-insensitive. Joining a room twice is a no-op. Unapproved accounts are refused.",
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined room", body = RoomResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Awaiting approval (APPROVAL_REQUIRED)", body = ErrorBody),
        (status = 404, description = "No room with that code (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn join_room(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<JoinRoomRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::Validation("Join code is required".into()));
    }

    require_approved(&state.db, auth_user.user_id).await?;

    let target = room::Entity::find()
        .filter(room::Column::Code.eq(&code))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid room code".into()))?;

    if is_member(&state.db, target.id, auth_user.user_id).await? {
        return Ok(Json(target.into()));
    }

    let inserted = room_member::ActiveModel {
        room_id: Set(target.id),
        user_id: Set(auth_user.user_id),
        joined_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await;

    match inserted {
        Ok(_) => tracing::info!(room_id = target.id, "Joined room"),
        // A concurrent join from the same user already enrolled them.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Json(target.into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Rooms",
    operation_id = "listMyRooms",
    summary = "Rooms the caller belongs to",
    description = "Most recently active first.",
    responses(
        (status = 200, description = "Rooms", body = Vec<RoomResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_rooms(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let room_ids: Vec<i32> = room_member::Entity::find()
        .filter(room_member::Column::UserId.eq(auth_user.user_id))
        .select_only()
        .column(room_member::Column::RoomId)
        .into_tuple()
        .all(&state.db)
        .await?;

    if room_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let rooms = room::Entity::find()
        .filter(room::Column::Id.is_in(room_ids))
        .order_by_desc(room::Column::UpdatedAt)
        .order_by_desc(room::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Rooms",
    operation_id = "getRoom",
    summary = "Room details with its members",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room", body = RoomDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_room(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RoomDetailResponse>, AppError> {
    let found = find_room(&state.db, id).await?;
    let member = is_member(&state.db, id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::ViewRoom, Target::room(member))?;

    let rows = room_member::Entity::find()
        .filter(room_member::Column::RoomId.eq(id))
        .find_also_related(user::Entity)
        .order_by_asc(room_member::Column::JoinedAt)
        .all(&state.db)
        .await?;

    let members = rows
        .into_iter()
        .filter_map(|(m, u)| {
            u.map(|u| RoomMemberResponse {
                user_id: m.user_id,
                email: u.email,
                full_name: u.full_name,
                role: u.role,
                joined_at: m.joined_at,
            })
        })
        .collect();

    Ok(Json(RoomDetailResponse {
        room: found.into(),
        members,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Rooms",
    operation_id = "deleteRoom",
    summary = "Delete a room",
    description = "Only the owner or a holder of `room:moderate` may delete. Memberships are removed with the room and connected chat clients are told and unsubscribed.",
    params(("id" = i32, Path, description = "Room ID")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_room(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let found = find_room(&state.db, id).await?;
    policy::authorize(
        &auth_user,
        Action::DeleteRoom,
        Target::owned_by(found.owner_id),
    )?;

    let txn = state.db.begin().await?;
    room_member::Entity::delete_many()
        .filter(room_member::Column::RoomId.eq(id))
        .exec(&txn)
        .await?;
    room::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    let evicted = state.hub.close_room(id);

    tracing::info!(room_id = id, deleted_by = auth_user.user_id, evicted, "Deleted room");
    Ok(StatusCode::NO_CONTENT)
}

/// Bump a room's activity timestamp so it sorts first in member room lists.
pub async fn touch_room<C: ConnectionTrait>(db: &C, room_id: i32) -> Result<(), AppError> {
    room::Entity::update_many()
        .col_expr(room::Column::UpdatedAt, sea_orm::sea_query::Expr::value(Utc::now()))
        .filter(room::Column::Id.eq(room_id))
        .exec(db)
        .await?;
    Ok(())
}
