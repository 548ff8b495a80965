use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_length, validate_url};
use crate::entity::{role, user};
use crate::error::AppError;

/// Request body for account registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Email address, unique case-insensitively.
    #[schema(example = "ada@uni.edu")]
    pub email: String,
    /// Password (6-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "Ada Lovelace")]
    pub full_name: String,
    /// `student` (default) or `teacher`.
    #[schema(example = "student")]
    pub role: Option<String>,
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.chars().count() <= 254
        && !email.chars().any(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            });
    if !valid {
        return Err(AppError::Validation("A valid email address is required".into()));
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    let password_len = payload.password.chars().count();
    if !(6..=128).contains(&password_len) {
        return Err(AppError::Validation(
            "Password must be 6-128 characters".into(),
        ));
    }
    validate_length("Full name", &payload.full_name, 1, 100)?;
    if let Some(role) = payload.role.as_deref()
        && role != role::STUDENT
        && role != role::TEACHER
    {
        return Err(AppError::Validation(
            "Role must be one of: student, teacher".into(),
        ));
    }
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@uni.edu")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ada@uni.edu")]
    pub email: String,
    #[schema(example = "student")]
    pub role: String,
}

impl From<user::Model> for RegisterResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Public view of an account. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub role: String,
    pub full_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub is_active: bool,
    pub is_approved: bool,
    /// Whether a student or teacher profile has been filled in.
    pub details_filled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            bio: user.bio,
            avatar_url: user.avatar_url,
            is_active: user.is_active,
            is_approved: user.is_approved,
            details_filled: user.details_filled,
            created_at: user.created_at,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
    /// Permissions granted to the user.
    #[schema(example = json!(["classroom:submit"]))]
    pub permissions: Vec<String>,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[schema(example = json!(["classroom:submit"]))]
    pub permissions: Vec<String>,
}

/// Profile fields a user may change about themselves.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    /// An uploaded file URL or an external image link. Empty clears it.
    pub avatar_url: Option<String>,
}

pub fn validate_update_me(payload: &UpdateMeRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.full_name {
        validate_length("Full name", name, 1, 100)?;
    }
    if let Some(bio) = &payload.bio {
        validate_length("Bio", bio, 0, 1000)?;
    }
    if let Some(url) = payload.avatar_url.as_deref().filter(|u| !u.trim().is_empty()) {
        validate_url("avatar_url", url)?;
    }
    Ok(())
}
