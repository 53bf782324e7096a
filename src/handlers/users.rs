use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::auth::create_token;
use crate::database::models::user::{User, UserNew, UserUpdate};
use crate::error::ApiError;
use crate::middleware::auth::{ensure_admin, ensure_self_or_admin, Identity};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route(
            "/users/:username",
            get(show).patch(update).delete(remove),
        )
        .route("/users/:username/jobs/:id", post(apply))
}

/// POST /users  (admin) -> 201 {user, token}
///
/// Admin-only creation, not self-registration: the new user may itself be an
/// admin. Self-registration lives under /auth/register.
async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(data): ApiJson<UserNew>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    ensure_admin(&identity)?;
    data.validate()?;
    let user = User::register(&state.pool, data).await?;
    let token = create_token(&user.username, user.is_admin, &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "token": token })),
    ))
}

/// GET /users  (admin) -> {users}
async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    ensure_admin(&identity)?;
    let users = User::find_all(&state.pool).await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/:username  (self or admin) -> {user}
async fn show(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ensure_self_or_admin(&identity, &username)?;
    let user = User::get(&state.pool, &username).await?;
    Ok(Json(json!({ "user": user })))
}

/// PATCH /users/:username  (self or admin) -> {user}
async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
    ApiJson(data): ApiJson<UserUpdate>,
) -> Result<Json<Value>, ApiError> {
    ensure_self_or_admin(&identity, &username)?;
    data.validate()?;
    let user = User::update(&state.pool, &username, data).await?;
    Ok(Json(json!({ "user": user })))
}

/// DELETE /users/:username  (self or admin) -> {deleted: username}
async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ensure_self_or_admin(&identity, &username)?;
    User::remove(&state.pool, &username).await?;
    Ok(Json(json!({ "deleted": username })))
}

/// POST /users/:username/jobs/:id  (self or admin) -> 201 {applied: id}
async fn apply(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((username, id)): Path<(String, i64)>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    ensure_self_or_admin(&identity, &username)?;
    let applied = User::apply_to_job(&state.pool, &username, id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "applied": applied }))))
}
