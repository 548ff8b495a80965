use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use super::academic::check_references;
use super::auth::require_approved;
use crate::entity::coursework;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::coursework::*;
use crate::models::shared::{PageQuery, Pagination, escape_like};
use crate::policy::{self, Action, Target};
use crate::state::AppState;

async fn find_coursework<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<coursework::Model, AppError> {
    coursework::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Coursework not found".into()))
}

fn sections_of(section_id: Option<i32>) -> Vec<i32> {
    section_id.into_iter().collect()
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Coursework",
    operation_id = "createCoursework",
    summary = "Announce coursework to a cohort",
    description = "Requires `classroom:teach` permission. Referenced intake, department and section must exist.",
    request_body = CreateCourseworkRequest,
    responses(
        (status = 201, description = "Coursework created", body = CourseworkResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_coursework(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourseworkRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageCoursework, Target::none())?;
    validate_create_coursework(&payload)?;
    check_references(
        &state.db,
        payload.department_id,
        &sections_of(payload.section_id),
        payload.intake_id,
    )
    .await?;

    let now = Utc::now();
    let model = coursework::ActiveModel {
        kind: Set(payload.kind),
        course_code: Set(payload.course_code.trim().to_string()),
        course_title: Set(payload.course_title.trim().to_string()),
        title: Set(payload.title.trim().to_string()),
        detail: Set(payload.detail.trim().to_string()),
        due_date: Set(payload.due_date),
        intake_id: Set(payload.intake_id),
        department_id: Set(payload.department_id),
        section_id: Set(payload.section_id),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(coursework_id = model.id, kind = model.kind.as_str(), "Created coursework");
    Ok((StatusCode::CREATED, Json(CourseworkResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Coursework",
    operation_id = "listCoursework",
    summary = "List coursework",
    description = "Soonest due first, then newest. Requires an approved account.",
    params(CourseworkListQuery),
    responses(
        (status = 200, description = "Coursework", body = CourseworkListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_coursework(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CourseworkListQuery>,
) -> Result<Json<CourseworkListResponse>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;

    let (page, per_page) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut select = coursework::Entity::find();
    if let Some(id) = query.intake_id {
        select = select.filter(coursework::Column::IntakeId.eq(id));
    }
    if let Some(id) = query.department_id {
        select = select.filter(coursework::Column::DepartmentId.eq(id));
    }
    if let Some(id) = query.section_id {
        select = select.filter(coursework::Column::SectionId.eq(id));
    }
    if let Some(kind) = query.kind {
        select = select.filter(coursework::Column::Kind.eq(kind));
    }
    if let Some(ref code) = query.course_code {
        let term = escape_like(code.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(coursework::Column::CourseCode)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }
    }
    if query.upcoming {
        select = select.filter(coursework::Column::DueDate.gte(Utc::now()));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_asc(coursework::Column::DueDate)
        .order_by_desc(coursework::Column::CreatedAt)
        .order_by_desc(coursework::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(CourseworkResponse::from)
        .collect();

    Ok(Json(CourseworkListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/by-type",
    tag = "Coursework",
    operation_id = "courseworkByType",
    summary = "A cohort's coursework grouped by kind",
    description = "`intake_id`, `department_id` and `section_id` are all required. Requires an approved account.",
    params(CohortQuery),
    responses(
        (status = 200, description = "Groups ordered by kind", body = Vec<CourseworkGroup>),
        (status = 400, description = "Missing cohort (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn coursework_by_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CohortQuery>,
) -> Result<Json<Vec<CourseworkGroup>>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;
    let (intake_id, department_id, section_id) = query.require()?;

    let items = coursework::Entity::find()
        .filter(coursework::Column::IntakeId.eq(intake_id))
        .filter(coursework::Column::DepartmentId.eq(department_id))
        .filter(coursework::Column::SectionId.eq(section_id))
        .order_by_desc(coursework::Column::CreatedAt)
        .order_by_desc(coursework::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(group_by_kind(items)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Coursework",
    operation_id = "getCoursework",
    summary = "A piece of coursework",
    params(("id" = i32, Path, description = "Coursework ID")),
    responses(
        (status = 200, description = "Coursework", body = CourseworkResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Account not approved (APPROVAL_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Coursework not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_coursework(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CourseworkResponse>, AppError> {
    require_approved(&state.db, auth_user.user_id).await?;
    Ok(Json(find_coursework(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Coursework",
    operation_id = "updateCoursework",
    summary = "Update coursework",
    description = "Requires `classroom:teach` permission. Only provided fields are changed.",
    params(("id" = i32, Path, description = "Coursework ID")),
    request_body = UpdateCourseworkRequest,
    responses(
        (status = 200, description = "Coursework updated", body = CourseworkResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Coursework not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_coursework(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCourseworkRequest>,
) -> Result<Json<CourseworkResponse>, AppError> {
    policy::authorize(&auth_user, Action::ManageCoursework, Target::none())?;
    validate_update_coursework(&payload)?;

    let existing = find_coursework(&state.db, id).await?;
    if payload == UpdateCourseworkRequest::default() {
        return Ok(Json(existing.into()));
    }
    check_references(
        &state.db,
        payload.department_id,
        &sections_of(payload.section_id),
        payload.intake_id,
    )
    .await?;

    let mut active: coursework::ActiveModel = existing.into();
    if let Some(kind) = payload.kind {
        active.kind = Set(kind);
    }
    if let Some(code) = payload.course_code {
        active.course_code = Set(code.trim().to_string());
    }
    if let Some(title) = payload.course_title {
        active.course_title = Set(title.trim().to_string());
    }
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(detail) = payload.detail {
        active.detail = Set(detail.trim().to_string());
    }
    if let Some(due) = payload.due_date {
        active.due_date = Set(Some(due));
    }
    if let Some(id) = payload.intake_id {
        active.intake_id = Set(Some(id));
    }
    if let Some(id) = payload.department_id {
        active.department_id = Set(Some(id));
    }
    if let Some(id) = payload.section_id {
        active.section_id = Set(Some(id));
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    tracing::info!("Updated coursework");
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Coursework",
    operation_id = "deleteCoursework",
    summary = "Delete coursework",
    description = "Requires `classroom:teach` permission.",
    params(("id" = i32, Path, description = "Coursework ID")),
    responses(
        (status = 204, description = "Coursework deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Coursework not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_coursework(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&auth_user, Action::ManageCoursework, Target::none())?;

    let result = coursework::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Coursework not found".into()));
    }

    tracing::info!(deleted_by = auth_user.user_id, "Deleted coursework");
    Ok(StatusCode::NO_CONTENT)
}
