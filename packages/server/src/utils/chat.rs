use chrono::Utc;
use common::MessageKind;
use common::realtime::ChatMessagePayload;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entity::chat_message;

/// Longest text message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Append a message to the room log.
pub async fn record_message<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
    sender_id: i32,
    kind: MessageKind,
    body: String,
    attachment_url: Option<String>,
) -> Result<chat_message::Model, DbErr> {
    chat_message::ActiveModel {
        room_id: Set(room_id),
        sender_id: Set(sender_id),
        kind: Set(kind),
        body: Set(body),
        attachment_url: Set(attachment_url),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// The latest `limit` messages of a room, oldest first.
pub async fn history<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
    limit: u64,
) -> Result<Vec<chat_message::Model>, DbErr> {
    let mut rows = chat_message::Entity::find()
        .filter(chat_message::Column::RoomId.eq(room_id))
        .order_by_desc(chat_message::Column::CreatedAt)
        .order_by_desc(chat_message::Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    rows.reverse();
    Ok(rows)
}

pub fn to_payload(msg: &chat_message::Model) -> ChatMessagePayload {
    let is_file = msg.kind == MessageKind::File;
    ChatMessagePayload {
        id: msg.id,
        sender: msg.sender_id,
        chat_room: msg.room_id,
        message: msg.body.clone(),
        message_type: is_file.then_some(MessageKind::File),
        file_url: if is_file { msg.attachment_url.clone() } else { None },
        file_name: is_file.then(|| msg.body.clone()),
        created_at: msg.created_at,
    }
}

/// File name to show for an announced upload when the client sent none.
pub fn file_name_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("file")
        .to_string()
}
