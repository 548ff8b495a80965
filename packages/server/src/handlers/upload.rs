use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use chrono::Utc;
use common::storage::{BoxReader, ContentHash, FileStore};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::entity::upload;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::upload::UploadResponse;
use crate::state::AppState;
use crate::utils::filename::{content_disposition, display_name};

/// Multipart framing overhead allowed on top of `max_upload_size`.
const MULTIPART_SLACK: usize = 64 * 1024;

pub fn upload_body_limit(cfg: &StorageConfig) -> DefaultBodyLimit {
    let max = usize::try_from(cfg.max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_SLACK))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores the `file` multipart field and returns its public URL. \
        Announce the file in chat with a `fileUpload` event carrying that URL, or attach it to a post, resource or submission.",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing field, bad name or too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut stored: Option<(ContentHash, i64)> = None;
    let mut raw_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        raw_name = field.file_name().map(|s| s.to_string());
        stored = Some(
            stream_field_to_store(field, &*state.files, state.config.storage.max_upload_size)
                .await?,
        );
        break;
    }

    let (hash, size) =
        stored.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let raw_name =
        raw_name.ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let filename =
        display_name(&raw_name).map_err(|e| AppError::Validation(e.message().into()))?;

    let content_type = mime_guess::from_path(&filename)
        .first()
        .map(|m| m.to_string());

    let model = upload::ActiveModel {
        id: Set(Uuid::now_v7()),
        content_hash: Set(hash.to_hex()),
        filename: Set(filename),
        content_type: Set(content_type),
        size: Set(size),
        uploader_id: Set(auth_user.user_id),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(upload_id = %model.id, size, "Stored upload");
    Ok((StatusCode::CREATED, Json(UploadResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "downloadFile",
    summary = "Download an uploaded file",
    description = "Streams the stored bytes. Supports ETag-based caching via If-None-Match. \
        File URLs are shared in chat and posts, so no token is required.",
    params(("id" = Uuid, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::Validation("Invalid file ID".into()))?;

    let found = upload::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    let etag = format!("\"{}\"", found.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let hash = ContentHash::from_hex(&found.content_hash)?;
    let reader = state.files.open(&hash).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = found
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, found.size.to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition(&found.filename))
        .header(header::ETAG, &etag)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Spool a multipart field to a temp file, then hand it to the store.
async fn stream_field_to_store(
    mut field: axum::extract::multipart::Field<'_>,
    store: &dyn FileStore,
    max_size: u64,
) -> Result<(ContentHash, i64), AppError> {
    let temp_path = std::env::temp_dir().join(format!("study-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }
        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        let hash = store.put_stream(reader).await?;

        Ok((hash, i64::try_from(total_size).unwrap_or(i64::MAX)))
    }
    .await;

    let _ = tokio::fs::remove_file(&temp_path).await;
    result
}
