pub mod models;
pub mod sql;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::AppConfig;

/// Build the process-wide connection pool. Constructed once in `main` and
/// handed down through `AppState`.
pub async fn connect(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;
    info!("database pool ready ({} max connections)", config.max_db_connections);
    Ok(pool)
}

/// Pool that defers connecting until first use. Router construction in tests
/// needs a pool before (or without) a reachable database.
pub fn connect_lazy(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect_lazy(&config.database_url)
}
