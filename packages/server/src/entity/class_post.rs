use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An announcement on a room's classroom stream.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub room_id: i32,
    pub author_id: i32,

    pub text: String,
    /// JSON array of `{file_url, file_name}` objects.
    #[sea_orm(column_type = "Json")]
    pub attachments: serde_json::Value,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
