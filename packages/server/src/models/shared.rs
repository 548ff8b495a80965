use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// `?page=&per_page=` with defaults applied by [`PageQuery::resolve`].
#[derive(Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageQuery {
    /// Page is at least 1; page size defaults to 20 and is capped at 100.
    pub fn resolve(&self) -> (u64, u64) {
        let page = Ord::max(self.page.unwrap_or(1), 1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page)
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate that a trimmed string has between `min` and `max` characters.
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(if min == 0 {
            AppError::Validation(format!("{field} must be at most {max} characters"))
        } else {
            AppError::Validation(format!("{field} must be {min}-{max} characters"))
        });
    }
    Ok(())
}

/// Accept `http(s)://` links and server-relative paths.
pub fn validate_url(field: &str, value: &str) -> Result<(), AppError> {
    let value = value.trim();
    let ok = value.starts_with("http://")
        || value.starts_with("https://")
        || (value.starts_with('/') && !value.starts_with("//"));
    if !ok || value.chars().count() > 2048 || value.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "{field} must be an http(s) URL or a server path"
        )));
    }
    Ok(())
}
