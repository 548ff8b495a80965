use common::{Gender, Shift};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Academic profile of a student account. At most one per account.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,

    /// Institution-issued ID.
    #[sea_orm(unique)]
    pub personal_id: String,
    pub name: String,
    pub gender: Gender,
    pub image: Option<String>,

    pub intake_id: Option<i32>,
    pub section_id: i32,
    pub department_id: i32,
    pub shift: Shift,
    /// Class representative of the section.
    pub is_class_cr: bool,

    pub contact_number: Option<String>,
    pub facebook_profile: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
