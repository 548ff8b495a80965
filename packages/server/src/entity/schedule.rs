use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A course offering over a date range with recurring weekly meetings.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,
    pub course_code: String,
    pub course_title: String,

    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,

    /// JSON array of `common::TimeSlot`.
    #[sea_orm(column_type = "Json")]
    pub time_slots: serde_json::Value,

    #[sea_orm(has_many)]
    pub sections: HasMany<super::schedule_section::Entity>,

    pub teacher_id: i32,
    pub created_by: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
