use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration, read once at startup and passed down through
/// `AppState` rather than held in a global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub max_db_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            database_url: "postgres://localhost/jobly".to_string(),
            jwt_secret: "secret-dev".to_string(),
            jwt_expiry_hours: 24 * 7,
            max_db_connections: 10,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by environment variables where set.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.port = v.parse().unwrap_or(self.port);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database_url = v;
        }
        if let Ok(v) = env::var("SECRET_KEY") {
            self.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.jwt_expiry_hours = v.parse().unwrap_or(self.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.max_db_connections = v.parse().unwrap_or(self.max_db_connections);
        }
        self
    }
}
