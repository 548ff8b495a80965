use serde::{Deserialize, Serialize};

use super::auth::UserResponse;
use super::shared::Pagination;
use crate::entity::role;
use crate::error::AppError;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Only users with this role.
    pub role: Option<String>,
    /// Only users awaiting (false) or past (true) approval.
    pub is_approved: Option<bool>,
    /// Case-insensitive match on email or full name.
    pub search: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

/// Administrative changes to an account.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "teacher")]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(r) = payload.role.as_deref()
        && ![role::ADMIN, role::TEACHER, role::STUDENT].contains(&r)
    {
        return Err(AppError::Validation(
            "Role must be one of: admin, teacher, student".into(),
        ));
    }
    Ok(())
}
