use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::grading;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use super::room::touch_room;
use crate::entity::{class_assignment, class_post, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::classroom::*;
use crate::policy::{self, Action, Target};
use crate::state::AppState;
use crate::utils::room::{find_room, is_member, member_ids};

async fn find_assignment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<class_assignment::Model, AppError> {
    class_assignment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}

async fn find_submission<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<submission::Model, AppError> {
    submission::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))
}

/// Resolve the caller's membership in an existing room.
async fn room_membership<C: ConnectionTrait>(
    db: &C,
    room_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    find_room(db, room_id).await?;
    is_member(db, room_id, user_id).await
}

#[utoipa::path(
    get,
    path = "/rooms/{room_id}/posts",
    tag = "Classroom",
    operation_id = "listPosts",
    summary = "Posts of a room",
    description = "Newest first. Members only.",
    params(("room_id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Posts", body = Vec<PostResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(room_id))]
pub async fn list_posts(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let member = room_membership(&state.db, room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::ListPosts, Target::room(member))?;

    let posts = class_post::Entity::find()
        .filter(class_post::Column::RoomId.eq(room_id))
        .order_by_desc(class_post::Column::CreatedAt)
        .order_by_desc(class_post::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/posts",
    tag = "Classroom",
    operation_id = "createPost",
    summary = "Post to a room's stream",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(room_id = payload.room_id))]
pub async fn create_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_post(&payload)?;
    let member = room_membership(&state.db, payload.room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::CreatePost, Target::room(member))?;

    let attachments: Vec<Attachment> = payload
        .attachments
        .into_iter()
        .map(|a| Attachment {
            file_url: a.file_url.trim().to_string(),
            file_name: a.file_name.trim().to_string(),
        })
        .collect();
    let attachments = serde_json::to_value(attachments)
        .map_err(|e| AppError::Internal(format!("Attachment encode error: {}", e)))?;

    let model = class_post::ActiveModel {
        room_id: Set(payload.room_id),
        author_id: Set(auth_user.user_id),
        text: Set(payload.text.trim().to_string()),
        attachments: Set(attachments),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    touch_room(&state.db, model.room_id).await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/rooms/{room_id}/assignments",
    tag = "Classroom",
    operation_id = "listAssignments",
    summary = "Assignments of a room",
    description = "Teachers and moderators see every assignment with answer keys. Students see assignments addressed to the whole room or to them, without answer keys.",
    params(("room_id" = i32, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Assignments, newest first", body = Vec<AssignmentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(room_id))]
pub async fn list_assignments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    let member = room_membership(&state.db, room_id, auth_user.user_id).await?;
    let target = Target::room(member);
    policy::authorize(&auth_user, Action::ListAssignments, target)?;
    let sees_all = policy::is_allowed(&auth_user, Action::SeeAllAssignments, target);

    let rows = class_assignment::Entity::find()
        .filter(class_assignment::Column::RoomId.eq(room_id))
        .order_by_desc(class_assignment::Column::CreatedAt)
        .order_by_desc(class_assignment::Column::Id)
        .all(&state.db)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for a in rows {
        if !sees_all {
            let to = assignees(&a)?;
            if !to.is_empty() && !to.contains(&auth_user.user_id) {
                continue;
            }
        }
        items.push(AssignmentResponse::new(a, sees_all)?);
    }

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/assignments",
    tag = "Classroom",
    operation_id = "createAssignment",
    summary = "Create an assignment",
    description = "Requires `classroom:teach` and membership of the room. Questions without text are dropped and assignees who are not members are ignored.",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(room_id = payload.room_id))]
pub async fn create_assignment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_assignment(&payload)?;
    let member = room_membership(&state.db, payload.room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::CreateAssignment, Target::room(member))?;

    let mut assigned_to = payload.assigned_to;
    if !assigned_to.is_empty() {
        let members = member_ids(&state.db, payload.room_id).await?;
        assigned_to.retain(|id| members.contains(id));
        assigned_to.sort_unstable();
        assigned_to.dedup();
        if assigned_to.is_empty() {
            return Err(AppError::Validation(
                "None of the assignees are members of this room".into(),
            ));
        }
    }

    let questions = sanitize_questions(payload.questions);
    let questions = serde_json::to_value(&questions)
        .map_err(|e| AppError::Internal(format!("Question encode error: {}", e)))?;
    let assigned = serde_json::to_value(&assigned_to)
        .map_err(|e| AppError::Internal(format!("Assignee encode error: {}", e)))?;

    let model = class_assignment::ActiveModel {
        room_id: Set(payload.room_id),
        creator_id: Set(auth_user.user_id),
        title: Set(payload.title.trim().to_string()),
        instructions: Set(payload
            .instructions
            .map(|s| s.trim().to_string())
            .unwrap_or_default()),
        questions: Set(questions),
        assigned_to: Set(assigned),
        due_date: Set(payload.due_date),
        total_points: Set(payload.total_points),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    touch_room(&state.db, model.room_id).await?;

    tracing::info!(assignment_id = model.id, "Created assignment");
    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse::new(model, true)?),
    ))
}

#[utoipa::path(
    delete,
    path = "/assignments/{id}",
    tag = "Classroom",
    operation_id = "deleteAssignment",
    summary = "Delete an assignment and its submissions",
    description = "Only the creator or a holder of `room:moderate`.",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_assignment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = find_assignment(&state.db, id).await?;
    policy::authorize(
        &auth_user,
        Action::DeleteAssignment,
        Target::owned_by(assignment.creator_id),
    )?;

    let txn = state.db.begin().await?;
    let removed = submission::Entity::delete_many()
        .filter(submission::Column::AssignmentId.eq(id))
        .exec(&txn)
        .await?;
    class_assignment::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        assignment_id = id,
        submissions = removed.rows_affected,
        "Deleted assignment"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "Classroom",
    operation_id = "submit",
    summary = "Submit or resubmit answers",
    description = "At most one submission exists per student and assignment; resubmitting replaces the previous answers. \
        When the assignment has answer keys the submission is graded immediately, overwriting any earlier grade. \
        Malformed answer entries are ignored.",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Stored submission", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not assigned or not a member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(assignment_id = payload.assignment_id, user_id = auth_user.user_id))]
pub async fn submit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<SubmitRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let extras = validate_submit(&mut payload)?;

    let assignment = find_assignment(&state.db, payload.assignment_id).await?;
    let member = is_member(&state.db, assignment.room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::Submit, Target::room(member))?;

    let to = assignees(&assignment)?;
    if !to.is_empty() && !to.contains(&auth_user.user_id) {
        return Err(AppError::PermissionDenied);
    }

    let answers = grading::normalize_answers(&payload.answers);
    let questions = assignment_questions(&assignment)?;
    let grade = grading::auto_grade(&questions, &answers, assignment.total_points);

    let answers = serde_json::to_value(&answers)
        .map_err(|e| AppError::Internal(format!("Answer encode error: {}", e)))?;

    let now = Utc::now();
    let row = submission::ActiveModel {
        assignment_id: Set(assignment.id),
        student_id: Set(auth_user.user_id),
        answers: Set(answers),
        file_url: Set(extras.file_url),
        link_url: Set(extras.link_url),
        text: Set(extras.text),
        grade: Set(grade),
        graded_by: Set(None),
        submitted_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let mut overwrite = vec![
        submission::Column::Answers,
        submission::Column::FileUrl,
        submission::Column::LinkUrl,
        submission::Column::Text,
        submission::Column::SubmittedAt,
        submission::Column::UpdatedAt,
    ];
    // Without answer keys a resubmission keeps whatever grade is stored.
    if grade.is_some() {
        overwrite.push(submission::Column::Grade);
        overwrite.push(submission::Column::GradedBy);
    }

    submission::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                submission::Column::AssignmentId,
                submission::Column::StudentId,
            ])
            .update_columns(overwrite)
            .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let stored = submission::Entity::find()
        .filter(submission::Column::AssignmentId.eq(assignment.id))
        .filter(submission::Column::StudentId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Submission missing after upsert".into()))?;

    tracing::info!(submission_id = stored.id, grade = ?stored.grade, "Stored submission");
    Ok(Json(stored.into()))
}

#[utoipa::path(
    get,
    path = "/assignments/{id}/submissions",
    tag = "Classroom",
    operation_id = "listSubmissions",
    summary = "Every submission for an assignment",
    description = "For grading. Requires `classroom:teach` in the room, or `room:moderate`.",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Submissions, latest first", body = Vec<SubmissionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    let assignment = find_assignment(&state.db, id).await?;
    let member = is_member(&state.db, assignment.room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::ListSubmissions, Target::room(member))?;

    let rows = submission::Entity::find()
        .filter(submission::Column::AssignmentId.eq(id))
        .order_by_desc(submission::Column::SubmittedAt)
        .order_by_desc(submission::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/assignments/{id}/mine",
    tag = "Classroom",
    operation_id = "getMySubmission",
    summary = "The caller's submission for an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Assignment or submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn my_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionResponse>, AppError> {
    find_assignment(&state.db, id).await?;

    let found = submission::Entity::find()
        .filter(submission::Column::AssignmentId.eq(id))
        .filter(submission::Column::StudentId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No submission yet".into()))?;

    Ok(Json(found.into()))
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/grade",
    tag = "Classroom",
    operation_id = "gradeSubmission",
    summary = "Set a submission's grade",
    description = "Overwrites any auto-grade and records the grader. The grade is clamped to `[0, total_points]`.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Graded submission", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, grader = auth_user.user_id))]
pub async fn grade_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<GradeRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    if !payload.grade.is_finite() {
        return Err(AppError::Validation("Grade must be a finite number".into()));
    }

    let existing = find_submission(&state.db, id).await?;
    let assignment = find_assignment(&state.db, existing.assignment_id).await?;
    let member = is_member(&state.db, assignment.room_id, auth_user.user_id).await?;
    policy::authorize(&auth_user, Action::Grade, Target::room(member))?;

    let total = grading::effective_total(
        &assignment_questions(&assignment)?,
        assignment.total_points,
    );
    let grade = grading::clamp_grade(payload.grade, total);

    let mut active: submission::ActiveModel = existing.into();
    active.grade = Set(Some(grade));
    active.graded_by = Set(Some(auth_user.user_id));
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}
