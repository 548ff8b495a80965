use axum::{
    Json,
    extract::{Path, State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use common::realtime::ChatMessagePayload;
use tracing::instrument;

use crate::config::MAX_HISTORY_LIMIT;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, bearer_token};
use crate::extractors::json::AppQuery;
use crate::models::chat::{HistoryQuery, PresenceResponse, SocketQuery};
use crate::policy::{self, Action, Target};
use crate::realtime;
use crate::state::AppState;
use crate::utils::{chat, room};

#[utoipa::path(
    get,
    path = "/{room_id}",
    tag = "Chat",
    operation_id = "chatHistory",
    summary = "Recent chat messages of a room",
    description = "The latest `limit` messages in chronological order. Use it to hydrate a client before joining the live channel.",
    params(("room_id" = i32, Path, description = "Room ID"), HistoryQuery),
    responses(
        (status = 200, description = "Messages, oldest first", body = Vec<ChatMessagePayload>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(room_id))]
pub async fn history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> Result<Json<Vec<ChatMessagePayload>>, AppError> {
    room::find_room(&state.db, room_id).await?;
    let member = room::is_member(&state.db, room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::ReadChatHistory, Target::room(member))?;

    let limit = query
        .limit
        .unwrap_or(state.config.chat.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows = chat::history(&state.db, room_id, limit).await?;
    Ok(Json(rows.iter().map(chat::to_payload).collect()))
}

#[utoipa::path(
    get,
    path = "/{room_id}/presence",
    tag = "Chat",
    operation_id = "chatPresence",
    summary = "Users currently connected to a room",
    params(("room_id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Connected users", body = PresenceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(room_id))]
pub async fn presence(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> Result<Json<PresenceResponse>, AppError> {
    room::find_room(&state.db, room_id).await?;
    let member = room::is_member(&state.db, room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::ViewRoom, Target::room(member))?;

    Ok(Json(PresenceResponse {
        room_id,
        user_ids: state.hub.present_users(room_id),
    }))
}

/// Upgrade to the realtime chat channel.
///
/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// also come as `?token=`. It is verified before the upgrade.
#[instrument(skip_all)]
pub async fn chat_socket(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SocketQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = match query.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => bearer_token(&headers)?.ok_or(AppError::TokenMissing)?,
    };
    let user = AuthUser::from_token(token, &state.config.auth.jwt_secret)?;

    tracing::debug!(user_id = user.user_id, "Upgrading chat connection");
    Ok(ws.on_upgrade(move |socket| realtime::session::run(socket, state, user)))
}
