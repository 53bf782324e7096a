// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// SQLSTATE class 23 codes the models care about.
pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const CHECK_VIOLATION: &str = "23514";

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every variant is terminal: nothing is retried or recovered internally.
/// The response body mirrors the status code: `{"error": {"message", "status"}}`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    /// Aggregated schema-validation failures; the message is the full list,
    /// never just the first violation.
    Validation(Vec<String>),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(errors: Vec<String>) -> Self {
        ApiError::Validation(errors)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Validation(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Internal(_) => 500,
        }
    }

    /// Client-safe error message.
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::Validation(errors) => errors.join("; "),
        }
    }

    /// Response body. Validation failures surface the message as a list.
    pub fn to_json(&self) -> Value {
        let message = match self {
            ApiError::Validation(errors) => json!(errors),
            other => json!(other.message()),
        };
        json!({
            "error": {
                "message": message,
                "status": self.status_code(),
            }
        })
    }
}

/// SQLSTATE code of a database-reported error, if any.
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

// Unclassified database failures propagate as generic server errors; the
// constraint codes are a backstop for races the pre-checks cannot close.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            _ => match sqlstate(&err).as_deref() {
                Some(UNIQUE_VIOLATION) => ApiError::bad_request("Duplicate key"),
                Some(FOREIGN_KEY_VIOLATION) => {
                    ApiError::bad_request("Referenced record does not exist")
                }
                Some(CHECK_VIOLATION) => ApiError::bad_request("Value out of allowed range"),
                _ => {
                    tracing::error!("database error: {}", err);
                    ApiError::internal("An error occurred while processing your request")
                }
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
