use common::{ClassPeriod, RoutineDay};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One cell of a section's weekly routine grid.
///
/// A section has at most one class per (day, period); the compound index
/// is created in `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_routine")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub day: RoutineDay,
    pub period: ClassPeriod,

    pub course_code: String,
    pub faculty_short_name: String,
    pub building: i32,
    pub room: i32,

    pub intake_id: Option<i32>,
    pub department_id: i32,
    pub section_id: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
