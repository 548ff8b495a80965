use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `ACCOUNT_DISABLED`,
    /// `PERMISSION_DENIED`, `APPROVAL_REQUIRED`, `NOT_FOUND`, `CONFLICT`,
    /// `EMAIL_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-150 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    AccountDisabled,
    PermissionDenied,
    /// The account exists but has not been approved by an administrator yet.
    ApprovalRequired,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::TokenMissing => "TOKEN_MISSING",
            AppError::TokenInvalid => "TOKEN_INVALID",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::AccountDisabled => "ACCOUNT_DISABLED",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::ApprovalRequired => "APPROVAL_REQUIRED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::EmailTaken => "EMAIL_TAKEN",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let code = self.code();
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::TokenMissing => (StatusCode::UNAUTHORIZED, "Authentication required".into()),
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "Invalid or expired token".into()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".into(),
            ),
            AppError::AccountDisabled => {
                (StatusCode::UNAUTHORIZED, "Account is disabled".into())
            }
            AppError::PermissionDenied => {
                (StatusCode::FORBIDDEN, "Insufficient permissions".into())
            }
            AppError::ApprovalRequired => (
                StatusCode::FORBIDDEN,
                "Account is awaiting administrator approval".into(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::EmailTaken => (StatusCode::CONFLICT, "Email is already registered".into()),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        };
        (status, ErrorBody { code, message })
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => write!(f, "{}: {msg}", self.code()),
            other => f.write_str(other.code()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".into()),
            StorageError::TooLarge { limit, .. } => {
                AppError::Validation(format!("File exceeds the {limit} byte upload limit"))
            }
            StorageError::InvalidHash(detail) => AppError::Internal(detail),
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}
