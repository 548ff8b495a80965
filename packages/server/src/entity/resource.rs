use common::ResourceKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A file or link shared with a room.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub room_id: i32,
    pub uploader_id: i32,

    pub kind: ResourceKind,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub link_url: Option<String>,
    pub description: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
