use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::entity::{room, room_member};
use crate::error::AppError;

/// Join code alphabet. Excludes `I`, `O`, `0` and `1`, which read alike.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LEN: usize = 6;

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of a code typed by a user.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Look up a room by ID, returning 404 if not found.
pub async fn find_room<C: ConnectionTrait>(db: &C, id: i32) -> Result<room::Model, AppError> {
    room::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".into()))
}

pub async fn is_member<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    Ok(room_member::Entity::find_by_id((room_id, user_id))
        .one(db)
        .await?
        .is_some())
}

/// User ids of every member of the room.
pub async fn member_ids<C: ConnectionTrait>(db: &C, room_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(room_member::Entity::find()
        .filter(room_member::Column::RoomId.eq(room_id))
        .select_only()
        .column(room_member::Column::UserId)
        .into_tuple()
        .all(db)
        .await?)
}
