use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ApiError;

/// JWT payload. Field names are part of the wire format clients rely on.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(username: impl Into<String>, is_admin: bool, expiry_hours: u64) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            is_admin,
            exp: (now + Duration::hours(expiry_hours as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Sign a token carrying `{username, isAdmin}` with the configured secret.
pub fn create_token(username: &str, is_admin: bool, config: &AppConfig) -> Result<String, ApiError> {
    if config.jwt_secret.is_empty() {
        return Err(ApiError::internal("JWT secret not configured"));
    }
    let claims = Claims::new(username, is_admin, config.jwt_expiry_hours);
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key).map_err(|e| {
        tracing::error!("token generation failed: {}", e);
        ApiError::internal("Failed to generate token")
    })
}

/// Verify signature and expiry. Any failure yields `None`; whether that is an
/// error is the caller's policy, not this function's.
pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .ok()
        .map(|data| data.claims)
}
