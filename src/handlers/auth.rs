use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::auth::create_token;
use crate::database::models::user::{User, UserNew};
use crate::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(token))
        .route("/auth/register", post(register))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoginRequest {
    username: String,
    password: String,
}

impl LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if self.username.is_empty() {
            errs.push("username must not be empty".to_string());
        }
        if self.password.is_empty() {
            errs.push("password must not be empty".to_string());
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

/// Self-registration payload: like `UserNew` but may never request admin.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RegisterRequest {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl RegisterRequest {
    fn into_new_user(self) -> UserNew {
        UserNew {
            username: self.username,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            is_admin: Some(false),
        }
    }
}

/// POST /auth/token  (anyone) -> {token}
async fn token(
    State(state): State<AppState>,
    ApiJson(data): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    data.validate()?;
    let user = User::authenticate(&state.pool, &data.username, &data.password).await?;
    let token = create_token(&user.username, user.is_admin, &state.config)?;
    Ok(Json(json!({ "token": token })))
}

/// POST /auth/register  (anyone) -> 201 {token}
async fn register(
    State(state): State<AppState>,
    ApiJson(data): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let data = data.into_new_user();
    data.validate()?;
    let user = User::register(&state.pool, data).await?;
    let token = create_token(&user.username, user.is_admin, &state.config)?;
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}
