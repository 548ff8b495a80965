use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_assignment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub room_id: i32,
    pub creator_id: i32,

    pub title: String,
    pub instructions: String,

    /// JSON array of `common::grading::Question`.
    #[sea_orm(column_type = "Json")]
    pub questions: serde_json::Value,

    /// JSON array of user ids. Empty means every room member.
    #[sea_orm(column_type = "Json")]
    pub assigned_to: serde_json::Value,

    pub due_date: Option<DateTimeUtc>,
    /// NULL falls back to the sum of question points.
    pub total_points: Option<f64>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::submission::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
