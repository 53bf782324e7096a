use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use crate::api::{ApiJson, ApiQuery};
use crate::database::models::job::{Job, JobNew, JobSearch, JobUpdate};
use crate::error::ApiError;
use crate::middleware::auth::{ensure_admin, Identity};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list).post(create))
        .route("/jobs/:id", get(show).patch(update).delete(remove))
}

/// POST /jobs  (admin) -> 201 {job}
async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(data): ApiJson<JobNew>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    ensure_admin(&identity)?;
    data.validate()?;
    let job = Job::create(&state.pool, data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// GET /jobs?title&minSalary&hasEquity  (anyone) -> {jobs}
async fn list(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<JobSearch>,
) -> Result<Json<Value>, ApiError> {
    search.validate()?;
    let jobs = Job::find_all(&state.pool, &search).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// GET /jobs/:id  (anyone) -> {job}
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let job = Job::get(&state.pool, id).await?;
    Ok(Json(json!({ "job": job })))
}

/// PATCH /jobs/:id  (admin) -> {job}
async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiJson(data): ApiJson<JobUpdate>,
) -> Result<Json<Value>, ApiError> {
    ensure_admin(&identity)?;
    data.validate()?;
    let job = Job::update(&state.pool, id, data).await?;
    Ok(Json(json!({ "job": job })))
}

/// DELETE /jobs/:id  (admin) -> {deleted: id}
async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    ensure_admin(&identity)?;
    Job::remove(&state.pool, id).await?;
    Ok(Json(json!({ "deleted": id.to_string() })))
}
