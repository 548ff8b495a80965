//! Automatic scoring of assignment submissions against answer keys.
//!
//! Everything here is pure: the server loads the assignment, feeds its
//! questions and the submitted answers through [`auto_grade`], and stores
//! whatever comes back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Total used when neither the assignment nor its questions declare points.
pub const DEFAULT_TOTAL_POINTS: f64 = 100.0;

/// One question of an assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Question {
    pub text: String,
    /// Answer key. Empty means the question is graded by hand.
    #[serde(default, alias = "correctAnswer")]
    pub correct_answer: String,
    #[serde(default)]
    pub points: f64,
}

impl Question {
    pub fn is_auto_gradable(&self) -> bool {
        !self.correct_answer.trim().is_empty()
    }
}

/// A single answer after normalization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Answer {
    #[serde(alias = "questionIndex")]
    pub question_index: usize,
    pub answer: String,
}

/// Turn a loosely shaped answers array into a clean list.
///
/// Entries that are not objects, lack an answer value, or carry an
/// unusable question index are dropped. A missing index defaults to the
/// entry's position in the array.
pub fn normalize_answers(raw: &[Value]) -> Vec<Answer> {
    raw.iter()
        .enumerate()
        .filter_map(|(position, entry)| normalize_one(position, entry))
        .collect()
}

fn normalize_one(position: usize, entry: &Value) -> Option<Answer> {
    let obj = entry.as_object()?;

    let answer = ["answer", "answer_text", "answerText"]
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(scalar_to_string)?;

    let question_index = match obj
        .get("question_index")
        .or_else(|| obj.get("questionIndex"))
    {
        None | Some(Value::Null) => position,
        Some(Value::Number(n)) => usize::try_from(n.as_u64()?).ok()?,
        Some(Value::String(s)) => s.trim().parse().ok()?,
        Some(_) => return None,
    };

    Some(Answer {
        question_index,
        answer,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The score ceiling for an assignment.
///
/// An explicit positive total wins, then the sum of question points, then
/// [`DEFAULT_TOTAL_POINTS`].
pub fn effective_total(questions: &[Question], explicit_total: Option<f64>) -> f64 {
    if let Some(total) = explicit_total.filter(|t| t.is_finite() && *t > 0.0) {
        return total;
    }
    let sum: f64 = questions
        .iter()
        .map(|q| q.points)
        .filter(|p| p.is_finite() && *p > 0.0)
        .sum();
    if sum > 0.0 { sum } else { DEFAULT_TOTAL_POINTS }
}

/// Clamp a grade into `[0, total]`. NaN becomes zero.
pub fn clamp_grade(grade: f64, total: f64) -> f64 {
    if grade.is_nan() {
        return 0.0;
    }
    grade.clamp(0.0, total.max(0.0))
}

/// Score `answers` against the answer keys of `questions`.
///
/// Returns `None` when no question has an answer key, in which case the
/// submission waits for a manual grade. Comparison trims both sides and
/// ignores case. A question is scored at most once even if several
/// answers point at it; the first one counts.
pub fn auto_grade(
    questions: &[Question],
    answers: &[Answer],
    explicit_total: Option<f64>,
) -> Option<f64> {
    if !questions.iter().any(Question::is_auto_gradable) {
        return None;
    }

    let mut scored = vec![false; questions.len()];
    let mut score = 0.0;
    for answer in answers {
        let Some(question) = questions.get(answer.question_index) else {
            continue;
        };
        if !question.is_auto_gradable() || scored[answer.question_index] {
            continue;
        }
        scored[answer.question_index] = true;

        let expected = question.correct_answer.trim().to_lowercase();
        if answer.answer.trim().to_lowercase() == expected && question.points.is_finite() {
            score += question.points;
        }
    }

    Some(clamp_grade(score, effective_total(questions, explicit_total)))
}
