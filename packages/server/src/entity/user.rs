use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lowercased.
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,

    pub role: String,
    #[sea_orm(belongs_to, from = "role", to = "name")]
    pub role_ref: Option<super::role::Entity>,

    pub full_name: String,
    pub bio: String,
    pub avatar_url: String,
    /// Set once the account has a student or teacher profile.
    pub details_filled: bool,

    pub is_active: bool,
    /// Students need an administrator's approval before joining rooms.
    pub is_approved: bool,

    #[sea_orm(has_many)]
    pub memberships: HasMany<super::room_member::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
