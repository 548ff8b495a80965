use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Number of most recent messages (default from `chat.history_limit`, max 500).
    pub limit: Option<u64>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SocketQuery {
    /// Bearer token, for clients that cannot set headers on the upgrade request.
    pub token: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PresenceResponse {
    pub room_id: i32,
    /// Users with at least one live connection subscribed to the room.
    pub user_ids: Vec<i32>,
}
