use serde::Serialize;
use uuid::Uuid;

use crate::entity::upload;

/// Route prefix under which stored files are served.
pub const FILES_PATH: &str = "/api/v1/files";

pub fn file_url(id: Uuid) -> String {
    format!("{FILES_PATH}/{id}")
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    /// Path to fetch the file; pass it as `fileUrl` when announcing it in chat.
    #[schema(example = "/api/v1/files/0190c2c4-9d5e-7a4e-8b1f-2f6a1c3d4e5f")]
    pub file_url: String,
    pub file_name: String,
    pub size: i64,
    pub content_type: Option<String>,
}

impl From<upload::Model> for UploadResponse {
    fn from(m: upload::Model) -> Self {
        Self {
            id: m.id,
            file_url: file_url(m.id),
            file_name: m.filename,
            size: m.size,
            content_type: m.content_type,
        }
    }
}
