use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::sql::{bind_value, sql_for_partial_update, to_field_map};
use crate::error::{sqlstate, ApiError, UNIQUE_VIOLATION};

const USER_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

/// A user row. The password hash never leaves the model.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Row shape for the credential lookup; only `authenticate` sees it.
#[derive(Debug, FromRow)]
struct UserCredentials {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
    is_admin: bool,
}

impl UserCredentials {
    fn into_user(self) -> User {
        User {
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            is_admin: self.is_admin,
        }
    }
}

/// Creation payload. Admin-only creation may set `isAdmin`; self-service
/// registration never does.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserNew {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// Partial-update payload; username and admin flag are not patchable.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn check_email(email: &str, errs: &mut Vec<String>) {
    if email.len() < 6 || !email.contains('@') {
        errs.push("email must be a valid address".to_string());
    }
}

fn check_password(password: &str, errs: &mut Vec<String>) {
    if password.len() < 5 || password.len() > 20 {
        errs.push("password must be 5-20 characters".to_string());
    }
}

impl UserNew {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if self.username.is_empty() || self.username.len() > 30 {
            errs.push("username must be 1-30 characters".to_string());
        }
        check_password(&self.password, &mut errs);
        if self.first_name.is_empty() {
            errs.push("firstName must not be empty".to_string());
        }
        if self.last_name.is_empty() {
            errs.push("lastName must not be empty".to_string());
        }
        check_email(&self.email, &mut errs);
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if matches!(&self.first_name, Some(name) if name.is_empty()) {
            errs.push("firstName must not be empty".to_string());
        }
        if matches!(&self.last_name, Some(name) if name.is_empty()) {
            errs.push("lastName must not be empty".to_string());
        }
        if let Some(password) = &self.password {
            check_password(password, &mut errs);
        }
        if let Some(email) = &self.email {
            check_email(email, &mut errs);
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            ApiError::internal("Failed to process password")
        })
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

impl User {
    /// Insert a new user with a freshly hashed password. The duplicate
    /// pre-check gives the friendly message; the primary key is the real
    /// guarantee.
    pub async fn register(pool: &PgPool, data: UserNew) -> Result<User, ApiError> {
        let duplicate =
            sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
                .bind(&data.username)
                .fetch_optional(pool)
                .await?;
        if duplicate.is_some() {
            return Err(ApiError::bad_request(format!(
                "Duplicate username: {}",
                data.username
            )));
        }

        let hashed = hash_password(&data.password)?;
        let sql = format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&data.username)
            .bind(&hashed)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(data.is_admin.unwrap_or(false))
            .fetch_one(pool)
            .await
            .map_err(|err| {
                if sqlstate(&err).as_deref() == Some(UNIQUE_VIOLATION) {
                    ApiError::bad_request(format!("Duplicate username: {}", data.username))
                } else {
                    err.into()
                }
            })
    }

    /// Verify a username/password pair. Unknown users and bad passwords get
    /// the same answer.
    pub async fn authenticate(
        pool: &PgPool,
        username: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let sql =
            "SELECT username, password, first_name, last_name, email, is_admin \
             FROM users WHERE username = $1";
        let row = sqlx::query_as::<_, UserCredentials>(sql)
            .bind(username)
            .fetch_optional(pool)
            .await?;
        match row {
            Some(row) if verify_password(password, &row.password) => Ok(row.into_user()),
            _ => Err(ApiError::unauthorized("Invalid username/password")),
        }
    }

    /// All users, ordered by username.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, ApiError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?)
    }

    pub async fn get(pool: &PgPool, username: &str) -> Result<User, ApiError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {username}")))
    }

    /// Partial update; a supplied password is rehashed before it is stored.
    pub async fn update(
        pool: &PgPool,
        username: &str,
        mut data: UserUpdate,
    ) -> Result<User, ApiError> {
        if let Some(password) = &data.password {
            data.password = Some(hash_password(password)?);
        }
        let fields = to_field_map(&data)?;
        let (set_cols, values) = sql_for_partial_update(
            &fields,
            &[("firstName", "first_name"), ("lastName", "last_name")],
        )?;
        let sql = format!(
            "UPDATE users SET {set_cols} WHERE username = ${} RETURNING {USER_COLUMNS}",
            values.len() + 1
        );
        let mut query = sqlx::query_as::<_, User>(&sql);
        for value in &values {
            query = bind_value(query, value);
        }
        query
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {username}")))
    }

    pub async fn remove(pool: &PgPool, username: &str) -> Result<(), ApiError> {
        let deleted =
            sqlx::query_scalar::<_, String>("DELETE FROM users WHERE username = $1 RETURNING username")
                .bind(username)
                .fetch_optional(pool)
                .await?;
        match deleted {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!("No user: {username}"))),
        }
    }

    /// Record that `username` applied to `job_id`. Both must exist; applying
    /// twice is rejected by the join table's primary key.
    pub async fn apply_to_job(pool: &PgPool, username: &str, job_id: i64) -> Result<i64, ApiError> {
        let user = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        if user.is_none() {
            return Err(ApiError::not_found(format!("No user: {username}")));
        }

        let job = sqlx::query_scalar::<_, i64>("SELECT id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(pool)
            .await?;
        if job.is_none() {
            return Err(ApiError::not_found(format!("No job: {job_id}")));
        }

        sqlx::query_scalar::<_, i64>(
            "INSERT INTO applications (username, job_id) VALUES ($1, $2) RETURNING job_id",
        )
        .bind(username)
        .bind(job_id)
        .fetch_one(pool)
        .await
        .map_err(|err| {
            if sqlstate(&err).as_deref() == Some(UNIQUE_VIOLATION) {
                ApiError::bad_request(format!("Already applied to job: {job_id}"))
            } else {
                err.into()
            }
        })
    }
}
