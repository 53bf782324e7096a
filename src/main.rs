use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use jobly_api::{config::AppConfig, database, handlers, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobly_api=debug,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let pool = database::connect(&config)
        .await
        .context("failed to connect to database")?;

    let state = AppState {
        pool,
        config: Arc::new(config),
    };

    let bind_addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("jobly-api listening on http://{bind_addr}");

    axum::serve(listener, handlers::app(state))
        .await
        .context("server")?;
    Ok(())
}
