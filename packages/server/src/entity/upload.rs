use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named reference to bytes in the file store.
///
/// Several uploads may share one `content_hash`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    /// UUIDv7 primary key, also the public file id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub content_hash: String,

    /// Original upload filename.
    pub filename: String,

    /// MIME content type.
    pub content_type: Option<String>,

    pub size: i64,

    pub uploader_id: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
