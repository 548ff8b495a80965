use chrono::{DateTime, Utc};
use common::grading::{self, Answer, Question};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::shared::{validate_length, validate_url};
use crate::entity::{class_assignment, class_post, submission};
use crate::error::AppError;

/// A file attached to a classroom post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Attachment {
    #[serde(alias = "fileUrl")]
    pub file_url: String,
    #[serde(alias = "fileName")]
    pub file_name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePostRequest {
    pub room_id: i32,
    #[schema(example = "Slides for week 3 are up.")]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

pub fn validate_create_post(payload: &CreatePostRequest) -> Result<(), AppError> {
    validate_length("Text", &payload.text, 0, 2000)?;
    if payload.text.trim().is_empty() && payload.attachments.is_empty() {
        return Err(AppError::Validation(
            "A post needs text or at least one attachment".into(),
        ));
    }
    if payload.attachments.len() > 10 {
        return Err(AppError::Validation("Too many attachments: max 10".into()));
    }
    for attachment in &payload.attachments {
        validate_url("file_url", &attachment.file_url)?;
        validate_length("File name", &attachment.file_name, 1, 255)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostResponse {
    pub id: i32,
    pub room_id: i32,
    pub author_id: i32,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl From<class_post::Model> for PostResponse {
    fn from(m: class_post::Model) -> Self {
        Self {
            id: m.id,
            room_id: m.room_id,
            author_id: m.author_id,
            text: m.text,
            attachments: serde_json::from_value(m.attachments).unwrap_or_default(),
            created_at: m.created_at,
        }
    }
}

/// A question as submitted by the assignment author.
///
/// Every field is optional on the wire; questions without text are dropped.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct QuestionInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "correctAnswer")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub points: Option<f64>,
}

impl QuestionInput {
    fn into_question(self) -> Option<Question> {
        let text = self.text?.trim().to_string();
        if text.is_empty() {
            return None;
        }
        Some(Question {
            text,
            correct_answer: self.correct_answer.unwrap_or_default().trim().to_string(),
            points: self.points.filter(|p| p.is_finite()).unwrap_or(0.0).max(0.0),
        })
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAssignmentRequest {
    pub room_id: i32,
    #[schema(example = "Problem set 2")]
    pub title: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
    /// Student ids. Empty assigns to every room member. Non-members are dropped.
    #[serde(default)]
    pub assigned_to: Vec<i32>,
    pub due_date: Option<DateTime<Utc>>,
    /// Defaults to the sum of question points, or 100.
    pub total_points: Option<f64>,
}

pub fn validate_create_assignment(payload: &CreateAssignmentRequest) -> Result<(), AppError> {
    validate_length("Title", &payload.title, 1, 200)?;
    if let Some(instructions) = &payload.instructions {
        validate_length("Instructions", instructions, 0, 10_000)?;
    }
    if payload.questions.len() > 200 {
        return Err(AppError::Validation("Too many questions: max 200".into()));
    }
    if let Some(total) = payload.total_points
        && !(total.is_finite() && total > 0.0)
    {
        return Err(AppError::Validation("total_points must be > 0".into()));
    }
    Ok(())
}

/// Keep questions that have text, normalizing answer keys and points.
pub fn sanitize_questions(inputs: Vec<QuestionInput>) -> Vec<Question> {
    inputs
        .into_iter()
        .filter_map(QuestionInput::into_question)
        .collect()
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentResponse {
    pub id: i32,
    pub room_id: i32,
    pub creator_id: i32,
    pub title: String,
    pub instructions: String,
    /// Answer keys are blanked for viewers who cannot grade.
    pub questions: Vec<Question>,
    pub assigned_to: Vec<i32>,
    pub due_date: Option<DateTime<Utc>>,
    /// Effective total: the explicit value, else the sum of points, else 100.
    pub total_points: f64,
    pub created_at: DateTime<Utc>,
}

impl AssignmentResponse {
    pub fn new(m: class_assignment::Model, reveal_answers: bool) -> Result<Self, AppError> {
        let mut questions = assignment_questions(&m)?;
        let assigned_to = assignees(&m)?;
        let total_points = grading::effective_total(&questions, m.total_points);
        if !reveal_answers {
            for q in &mut questions {
                q.correct_answer.clear();
            }
        }
        Ok(Self {
            id: m.id,
            room_id: m.room_id,
            creator_id: m.creator_id,
            title: m.title,
            instructions: m.instructions,
            questions,
            assigned_to,
            due_date: m.due_date,
            total_points,
            created_at: m.created_at,
        })
    }
}

/// Decode a JSON column of an assignment row. A value that does not decode
/// means the row was written by something other than this server.
fn decode_column<T: DeserializeOwned>(
    id: i32,
    column: &str,
    value: &serde_json::Value,
) -> Result<T, AppError> {
    serde_json::from_value(value.clone()).map_err(|e| {
        AppError::Internal(format!("Assignment {id} has a corrupt {column} column: {e}"))
    })
}

pub fn assignment_questions(m: &class_assignment::Model) -> Result<Vec<Question>, AppError> {
    decode_column(m.id, "questions", &m.questions)
}

pub fn assignees(m: &class_assignment::Model) -> Result<Vec<i32>, AppError> {
    decode_column(m.id, "assigned_to", &m.assigned_to)
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    #[serde(alias = "assignment")]
    pub assignment_id: i32,
    /// Loosely shaped answers; malformed entries are ignored.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub answers: Vec<serde_json::Value>,
    pub file_url: Option<String>,
    pub link_url: Option<String>,
    pub text: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trimmed, validated attachment fields of a submission.
pub struct SubmissionExtras {
    pub file_url: Option<String>,
    pub link_url: Option<String>,
    pub text: Option<String>,
}

pub fn validate_submit(payload: &mut SubmitRequest) -> Result<SubmissionExtras, AppError> {
    if payload.answers.len() > 500 {
        return Err(AppError::Validation("Too many answers: max 500".into()));
    }
    let extras = SubmissionExtras {
        file_url: non_empty(payload.file_url.take()),
        link_url: non_empty(payload.link_url.take()),
        text: non_empty(payload.text.take()),
    };
    if let Some(url) = &extras.file_url {
        validate_url("file_url", url)?;
    }
    if let Some(url) = &extras.link_url {
        validate_url("link_url", url)?;
    }
    if let Some(text) = &extras.text {
        validate_length("Text", text, 0, 20_000)?;
    }
    Ok(extras)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub assignment_id: i32,
    pub student_id: i32,
    pub answers: Vec<Answer>,
    pub file_url: Option<String>,
    pub link_url: Option<String>,
    pub text: Option<String>,
    pub grade: Option<f64>,
    pub graded_by: Option<i32>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<submission::Model> for SubmissionResponse {
    fn from(m: submission::Model) -> Self {
        Self {
            id: m.id,
            assignment_id: m.assignment_id,
            student_id: m.student_id,
            answers: serde_json::from_value(m.answers).unwrap_or_default(),
            file_url: m.file_url,
            link_url: m.link_url,
            text: m.text,
            grade: m.grade,
            graded_by: m.graded_by,
            submitted_at: m.submitted_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct GradeRequest {
    /// Clamped to `[0, total_points]` of the assignment.
    #[schema(example = 8.5)]
    pub grade: f64,
}
