use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use crate::api::{ApiJson, ApiQuery};
use crate::database::models::company::{Company, CompanyNew, CompanySearch, CompanyUpdate};
use crate::error::ApiError;
use crate::middleware::auth::{ensure_admin, Identity};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list).post(create))
        .route(
            "/companies/:handle",
            get(show).patch(update).delete(remove),
        )
}

/// POST /companies  (admin) -> 201 {company}
async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(data): ApiJson<CompanyNew>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    ensure_admin(&identity)?;
    data.validate()?;
    let company = Company::create(&state.pool, data).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

/// GET /companies?minEmployees&maxEmployees&nameLike  (anyone) -> {companies}
async fn list(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<CompanySearch>,
) -> Result<Json<Value>, ApiError> {
    search.validate()?;
    let companies = Company::find_all(&state.pool, &search).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// GET /companies/:handle  (anyone) -> {company}
async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let company = Company::get(&state.pool, &handle).await?;
    Ok(Json(json!({ "company": company })))
}

/// PATCH /companies/:handle  (admin) -> {company}
async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(handle): Path<String>,
    ApiJson(data): ApiJson<CompanyUpdate>,
) -> Result<Json<Value>, ApiError> {
    ensure_admin(&identity)?;
    data.validate()?;
    let company = Company::update(&state.pool, &handle, data).await?;
    Ok(Json(json!({ "company": company })))
}

/// DELETE /companies/:handle  (admin) -> {deleted: handle}
async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ensure_admin(&identity)?;
    Company::remove(&state.pool, &handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}
