use std::sync::Arc;

use common::storage::FileStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::realtime::ChatHub;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub files: Arc<dyn FileStore>,
    pub hub: Arc<ChatHub>,
}
