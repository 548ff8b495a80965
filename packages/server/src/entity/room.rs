use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,

    /// Six-character join code. The unique index is what keeps codes
    /// distinct; creation retries on a collision.
    #[sea_orm(unique)]
    pub code: String,

    pub owner_id: i32,

    #[sea_orm(has_many)]
    pub members: HasMany<super::room_member::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
