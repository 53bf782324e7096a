use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::database::sql::{bind_value, sql_for_partial_update, to_field_map, WhereBuilder};
use crate::error::{sqlstate, ApiError, FOREIGN_KEY_VIOLATION};

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

/// A job row. `equity` is a NUMERIC in [0,1] and serializes as a decimal
/// string, matching what clients already parse.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Creation payload. The referenced company must already exist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobNew {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// Partial-update payload; `id` and `companyHandle` are immutable.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<f64>,
}

/// Optional search filters for `GET /jobs`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobSearch {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

fn check_equity(equity: Option<f64>, errs: &mut Vec<String>) {
    if matches!(equity, Some(e) if !(0.0..=1.0).contains(&e)) {
        errs.push("equity must be between 0 and 1".to_string());
    }
}

impl JobNew {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if self.title.is_empty() {
            errs.push("title must not be empty".to_string());
        }
        if matches!(self.salary, Some(s) if s < 0) {
            errs.push("salary must be >= 0".to_string());
        }
        check_equity(self.equity, &mut errs);
        if self.company_handle.is_empty() {
            errs.push("companyHandle must not be empty".to_string());
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

impl JobUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if matches!(&self.title, Some(title) if title.is_empty()) {
            errs.push("title must not be empty".to_string());
        }
        if matches!(self.salary, Some(s) if s < 0) {
            errs.push("salary must be >= 0".to_string());
        }
        check_equity(self.equity, &mut errs);
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

impl JobSearch {
    pub fn validate(&self) -> Result<(), ApiError> {
        if matches!(self.min_salary, Some(s) if s < 0) {
            return Err(ApiError::validation(vec![
                "minSalary must be >= 0".to_string()
            ]));
        }
        Ok(())
    }
}

impl Job {
    /// Insert a new job. The company-existence pre-check gives the friendly
    /// message; the foreign key is the real guarantee.
    pub async fn create(pool: &PgPool, data: JobNew) -> Result<Job, ApiError> {
        let company =
            sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
                .bind(&data.company_handle)
                .fetch_optional(pool)
                .await?;
        if company.is_none() {
            return Err(ApiError::bad_request(format!(
                "Company does not exist: {}",
                data.company_handle
            )));
        }

        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&sql)
            .bind(&data.title)
            .bind(data.salary)
            .bind(data.equity)
            .bind(&data.company_handle)
            .fetch_one(pool)
            .await
            .map_err(|err| {
                if sqlstate(&err).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    ApiError::bad_request(format!(
                        "Company does not exist: {}",
                        data.company_handle
                    ))
                } else {
                    err.into()
                }
            })
    }

    /// All jobs matching the optional filters, ordered by company then title.
    pub async fn find_all(pool: &PgPool, filters: &JobSearch) -> Result<Vec<Job>, ApiError> {
        let (where_clause, params) = Self::filter_by_query(filters);
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs {where_clause} ORDER BY company_handle, title"
        );
        let mut query = sqlx::query_as::<_, Job>(&sql);
        for param in &params {
            query = bind_value(query, param);
        }
        Ok(query.fetch_all(pool).await?)
    }

    /// Compose the `WHERE` fragment for the optional search parameters.
    ///
    /// Presence is decided by `Option`, never by falsiness: `minSalary=0` is
    /// a real filter, and `hasEquity=false` means exactly `equity = 0`.
    fn filter_by_query(filters: &JobSearch) -> (String, Vec<Value>) {
        let mut builder = WhereBuilder::new();
        if let Some(title) = &filters.title {
            builder.ilike_contains("title", title);
        }
        if let Some(min) = filters.min_salary {
            builder.gte("salary", min);
        }
        match filters.has_equity {
            Some(true) => builder.literal("equity > 0"),
            Some(false) => builder.literal("equity = 0"),
            None => {}
        }
        builder.build()
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Job, ApiError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {id}")))
    }

    /// Partial update: only the supplied fields change.
    pub async fn update(pool: &PgPool, id: i64, data: JobUpdate) -> Result<Job, ApiError> {
        let fields = to_field_map(&data)?;
        let (set_cols, values) = sql_for_partial_update(&fields, &[])?;
        let sql = format!(
            "UPDATE jobs SET {set_cols} WHERE id = ${} RETURNING {JOB_COLUMNS}",
            values.len() + 1
        );
        let mut query = sqlx::query_as::<_, Job>(&sql);
        for value in &values {
            query = bind_value(query, value);
        }
        query
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {id}")))
    }

    pub async fn remove(pool: &PgPool, id: i64) -> Result<(), ApiError> {
        let deleted = sqlx::query_scalar::<_, i64>("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        match deleted {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!("No job: {id}"))),
        }
    }
}
