use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The role assigned when registration does not ask for one.
pub const DEFAULT_ROLE: &str = "student";

pub const ADMIN: &str = "admin";
pub const TEACHER: &str = "teacher";
pub const STUDENT: &str = "student";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    #[sea_orm(has_many)]
    pub users: HasMany<super::user::Entity>,

    #[sea_orm(has_many)]
    pub permissions: HasMany<super::role_permission::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
