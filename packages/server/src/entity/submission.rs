use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A student's answers to an assignment.
///
/// At most one row per `(assignment_id, student_id)`; the compound unique
/// index is created in `seed::ensure_indexes` and resubmission upserts on it.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub assignment_id: i32,
    #[sea_orm(belongs_to, from = "assignment_id", to = "id")]
    pub assignment: Option<super::class_assignment::Entity>,

    pub student_id: i32,

    /// JSON array of `common::grading::Answer`.
    #[sea_orm(column_type = "Json")]
    pub answers: serde_json::Value,
    pub file_url: Option<String>,
    pub link_url: Option<String>,
    pub text: Option<String>,

    pub grade: Option<f64>,
    /// NULL when the grade came from the auto-grader or is still missing.
    pub graded_by: Option<i32>,

    pub submitted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
