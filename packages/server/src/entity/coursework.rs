use common::CourseworkKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coursework announced to a cohort outside any room: assignments, lab
/// reports and presentations with a due date.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coursework")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kind: CourseworkKind,
    pub course_code: String,
    pub course_title: String,
    pub title: String,
    pub detail: String,
    pub due_date: Option<DateTimeUtc>,

    pub intake_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,

    pub created_by: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
