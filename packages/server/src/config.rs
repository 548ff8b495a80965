use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Upper bound for `chat.history_limit` and the `limit` query parameter.
pub const MAX_HISTORY_LIMIT: u64 = 500;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// When both are set, an admin account with these credentials is
    /// created at start-up if the email is not registered yet.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for uploaded files.
    pub data_dir: String,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Messages returned by the history endpoint when no `limit` is given.
    pub history_limit: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", vec!["*"])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("storage.data_dir", "./data/uploads")?
            .set_default("storage.max_upload_size", 20 * 1024 * 1024)?
            .set_default("chat.history_limit", 100)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., STUDY__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("STUDY").separator("__"))
            .build()?;

        let mut cfg: AppConfig = s.try_deserialize()?;
        cfg.chat.history_limit = cfg.chat.history_limit.clamp(1, MAX_HISTORY_LIMIT);
        Ok(cfg)
    }
}
