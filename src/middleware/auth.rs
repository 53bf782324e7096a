use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated caller extracted from a verified JWT.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

/// Request identity. `None` when no token was provided or verification
/// failed; that alone is never an error -- the gates below decide.
#[derive(Clone, Debug, Default)]
pub struct Identity(pub Option<AuthUser>);

/// Middleware: verify a bearer token if one was sent and attach the identity
/// to the request. Runs on every route.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = bearer_token(&request)
        .and_then(|token| auth::decode_token(&token, &state.config.jwt_secret))
        .map(|claims| AuthUser {
            username: claims.username,
            is_admin: claims.is_admin,
        });
    request.extensions_mut().insert(Identity(identity));
    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<String> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Gate: caller must be logged in.
pub fn ensure_logged_in(identity: &Identity) -> Result<&AuthUser, ApiError> {
    identity
        .0
        .as_ref()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
}

/// Gate: caller must be a logged-in admin.
pub fn ensure_admin(identity: &Identity) -> Result<&AuthUser, ApiError> {
    let user = ensure_logged_in(identity)?;
    if user.is_admin {
        Ok(user)
    } else {
        Err(ApiError::unauthorized("Unauthorized"))
    }
}

/// Gate: caller must be the named user, or an admin.
pub fn ensure_self_or_admin<'a>(
    identity: &'a Identity,
    username: &str,
) -> Result<&'a AuthUser, ApiError> {
    let user = ensure_logged_in(identity)?;
    if user.username == username || user.is_admin {
        Ok(user)
    } else {
        Err(ApiError::unauthorized("Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anon() -> Identity {
        Identity(None)
    }

    fn user(username: &str, is_admin: bool) -> Identity {
        Identity(Some(AuthUser {
            username: username.to_string(),
            is_admin,
        }))
    }

    #[test]
    fn logged_in_gate() {
        assert!(ensure_logged_in(&anon()).is_err());
        assert!(ensure_logged_in(&user("u1", false)).is_ok());
    }

    #[test]
    fn admin_gate() {
        assert!(ensure_admin(&anon()).is_err());
        assert!(ensure_admin(&user("u1", false)).is_err());
        assert!(ensure_admin(&user("u1", true)).is_ok());
    }

    #[test]
    fn self_or_admin_gate() {
        assert!(ensure_self_or_admin(&user("u2", false), "u2").is_ok());
        assert!(ensure_self_or_admin(&user("admin", true), "u2").is_ok());
        assert!(ensure_self_or_admin(&user("u1", false), "u2").is_err());
        assert!(ensure_self_or_admin(&anon(), "u2").is_err());
    }

    #[test]
    fn gates_fail_with_unauthorized_not_found_free() {
        let err = ensure_admin(&user("u1", false)).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
