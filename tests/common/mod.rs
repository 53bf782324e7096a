use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use jobly_api::auth::create_token;
use jobly_api::config::AppConfig;
use jobly_api::{database, handlers, AppState};

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgres://postgres@localhost/jobly_test".to_string()),
        jwt_secret: "test-secret".to_string(),
        jwt_expiry_hours: 1,
        ..AppConfig::default()
    }
}

/// Router over a lazy pool: nothing touches the database until a handler
/// actually issues a query, so auth-gate tests run without Postgres.
pub fn test_app() -> Router {
    let config = test_config();
    let pool = database::connect_lazy(&config).expect("lazy pool");
    handlers::app(AppState {
        pool,
        config: Arc::new(config),
    })
}

pub fn app_with_state(state: AppState) -> Router {
    handlers::app(state)
}

pub fn admin_token() -> String {
    create_token("admin", true, &test_config()).expect("admin token")
}

pub fn u1_token() -> String {
    create_token("u1", false, &test_config()).expect("u1 token")
}

pub fn u2_token() -> String {
    create_token("u2", false, &test_config()).expect("u2 token")
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
