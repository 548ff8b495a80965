use common::MessageKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only room chat log. Rows are never updated.
///
/// `room_id` is a plain reference: deleting a room leaves its messages behind.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_message")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub room_id: i32,
    pub sender_id: i32,

    pub kind: MessageKind,
    /// Message text, or the file name for file messages.
    pub body: String,
    /// Set iff `kind` is `File`.
    pub attachment_url: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
