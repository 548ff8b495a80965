use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A section attending a schedule.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule_section")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub schedule_id: i32,
    #[sea_orm(belongs_to, from = "schedule_id", to = "id")]
    pub schedule: Option<super::schedule::Entity>,

    #[sea_orm(primary_key, auto_increment = false)]
    pub section_id: i32,
}

impl ActiveModelBehavior for ActiveModel {}
