use chrono::{DateTime, Utc};
use common::ResourceKind;
use serde::{Deserialize, Serialize};

use super::shared::{validate_length, validate_url};
use crate::entity::resource;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateResourceRequest {
    pub room_id: i32,
    pub kind: ResourceKind,
    /// Required for `file` resources, usually the `file_url` of an upload.
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    /// Required for `link` resources.
    pub link_url: Option<String>,
    pub description: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn validate_create_resource(payload: &CreateResourceRequest) -> Result<(), AppError> {
    match payload.kind {
        ResourceKind::File => {
            let url = present(&payload.file_url).ok_or_else(|| {
                AppError::Validation("file_url is required for file resources".into())
            })?;
            validate_url("file_url", url)?;
            if let Some(name) = present(&payload.file_name) {
                validate_length("File name", name, 1, 255)?;
            }
        }
        ResourceKind::Link => {
            let url = present(&payload.link_url).ok_or_else(|| {
                AppError::Validation("link_url is required for link resources".into())
            })?;
            validate_url("link_url", url)?;
        }
    }
    if let Some(desc) = &payload.description {
        validate_length("Description", desc, 0, 1000)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ResourceResponse {
    pub id: i32,
    pub room_id: i32,
    pub uploader_id: i32,
    pub kind: ResourceKind,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub link_url: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<resource::Model> for ResourceResponse {
    fn from(m: resource::Model) -> Self {
        Self {
            id: m.id,
            room_id: m.room_id,
            uploader_id: m.uploader_id,
            kind: m.kind,
            file_url: m.file_url,
            file_name: m.file_name,
            link_url: m.link_url,
            description: m.description,
            created_at: m.created_at,
        }
    }
}
