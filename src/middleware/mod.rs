pub mod auth;

pub use auth::{authenticate, ensure_admin, ensure_logged_in, ensure_self_or_admin, AuthUser, Identity};
