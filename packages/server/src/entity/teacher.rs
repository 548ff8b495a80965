use common::Gender;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Academic profile of a teacher account. At most one per account.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teacher")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,

    #[sea_orm(unique)]
    pub personal_id: String,
    pub name: String,
    pub gender: Gender,
    pub image: Option<String>,

    pub department_id: i32,
    pub is_intake_incharge: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
