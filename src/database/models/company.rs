use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use url::Url;

use crate::database::sql::{bind_value, sql_for_partial_update, to_field_map, WhereBuilder};
use crate::error::{sqlstate, ApiError, UNIQUE_VIOLATION};

const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// A company row, serialized with the API's camelCase field names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Creation payload. `handle` is the company's permanent identifier.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyNew {
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Partial-update payload; the handle itself is immutable.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_employees: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Optional search filters for `GET /companies`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanySearch {
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
    pub name_like: Option<String>,
}

impl CompanyNew {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if self.handle.is_empty() || self.handle.len() > 25 {
            errs.push("handle must be 1-25 characters".to_string());
        }
        if self.name.is_empty() {
            errs.push("name must not be empty".to_string());
        }
        if matches!(self.num_employees, Some(n) if n < 0) {
            errs.push("numEmployees must be >= 0".to_string());
        }
        if let Some(url) = &self.logo_url {
            if Url::parse(url).is_err() {
                errs.push("logoUrl must be a valid URL".to_string());
            }
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

impl CompanyUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if matches!(&self.name, Some(name) if name.is_empty()) {
            errs.push("name must not be empty".to_string());
        }
        if matches!(self.num_employees, Some(n) if n < 0) {
            errs.push("numEmployees must be >= 0".to_string());
        }
        if let Some(url) = &self.logo_url {
            if Url::parse(url).is_err() {
                errs.push("logoUrl must be a valid URL".to_string());
            }
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

impl CompanySearch {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errs = Vec::new();
        if matches!(self.min_employees, Some(n) if n < 0) {
            errs.push("minEmployees must be >= 0".to_string());
        }
        if matches!(self.max_employees, Some(n) if n < 0) {
            errs.push("maxEmployees must be >= 0".to_string());
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errs))
        }
    }
}

impl Company {
    /// Insert a new company. The duplicate pre-check exists for the friendly
    /// message; the unique constraint is the real guarantee.
    pub async fn create(pool: &PgPool, data: CompanyNew) -> Result<Company, ApiError> {
        let duplicate =
            sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
                .bind(&data.handle)
                .fetch_optional(pool)
                .await?;
        if duplicate.is_some() {
            return Err(ApiError::bad_request(format!(
                "Duplicate company: {}",
                data.handle
            )));
        }

        let sql = format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMPANY_COLUMNS}"
        );
        sqlx::query_as::<_, Company>(&sql)
            .bind(&data.handle)
            .bind(&data.name)
            .bind(&data.description)
            .bind(data.num_employees)
            .bind(&data.logo_url)
            .fetch_one(pool)
            .await
            .map_err(|err| {
                if sqlstate(&err).as_deref() == Some(UNIQUE_VIOLATION) {
                    ApiError::bad_request(format!("Duplicate company: {}", data.handle))
                } else {
                    err.into()
                }
            })
    }

    /// All companies matching the optional filters, ordered by name.
    ///
    /// Rejects `minEmployees > maxEmployees` before building any SQL.
    pub async fn find_all(pool: &PgPool, filters: &CompanySearch) -> Result<Vec<Company>, ApiError> {
        if let (Some(min), Some(max)) = (filters.min_employees, filters.max_employees) {
            if min > max {
                return Err(ApiError::bad_request(
                    "minEmployees must be less than maxEmployees",
                ));
            }
        }

        let (where_clause, params) = Self::filter_by_query(filters);
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies {where_clause} ORDER BY name");
        let mut query = sqlx::query_as::<_, Company>(&sql);
        for param in &params {
            query = bind_value(query, param);
        }
        Ok(query.fetch_all(pool).await?)
    }

    /// Compose the `WHERE` fragment for the optional search parameters.
    /// Presence is decided by `Option`, so zero-valued filters still apply.
    fn filter_by_query(filters: &CompanySearch) -> (String, Vec<Value>) {
        let mut builder = WhereBuilder::new();
        if let Some(min) = filters.min_employees {
            builder.gte("num_employees", min);
        }
        if let Some(max) = filters.max_employees {
            builder.lte("num_employees", max);
        }
        if let Some(name) = &filters.name_like {
            builder.ilike_contains("name", name);
        }
        builder.build()
    }

    pub async fn get(pool: &PgPool, handle: &str) -> Result<Company, ApiError> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE handle = $1");
        sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No company: {handle}")))
    }

    /// Partial update: only the supplied fields change.
    pub async fn update(
        pool: &PgPool,
        handle: &str,
        data: CompanyUpdate,
    ) -> Result<Company, ApiError> {
        let fields = to_field_map(&data)?;
        let (set_cols, values) = sql_for_partial_update(
            &fields,
            &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")],
        )?;
        let sql = format!(
            "UPDATE companies SET {set_cols} WHERE handle = ${} RETURNING {COMPANY_COLUMNS}",
            values.len() + 1
        );
        let mut query = sqlx::query_as::<_, Company>(&sql);
        for value in &values {
            query = bind_value(query, value);
        }
        query
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No company: {handle}")))
    }

    pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), ApiError> {
        let deleted =
            sqlx::query_scalar::<_, String>("DELETE FROM companies WHERE handle = $1 RETURNING handle")
                .bind(handle)
                .fetch_optional(pool)
                .await?;
        match deleted {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!("No company: {handle}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_filters_yields_empty_clause() {
        let (clause, params) = Company::filter_by_query(&CompanySearch::default());
        assert_eq!(clause, "");
        assert!(params.is_empty());
    }

    #[test]
    fn all_filters_compose_in_order() {
        let filters = CompanySearch {
            min_employees: Some(2),
            max_employees: Some(10),
            name_like: Some("net".to_string()),
        };
        let (clause, params) = Company::filter_by_query(&filters);
        assert_eq!(
            clause,
            "WHERE num_employees >= $1 AND num_employees <= $2 AND name ILIKE $3"
        );
        assert_eq!(params, vec![json!(2), json!(10), json!("%net%")]);
    }

    #[test]
    fn zero_valued_min_is_still_a_filter() {
        let filters = CompanySearch {
            min_employees: Some(0),
            ..Default::default()
        };
        let (clause, params) = Company::filter_by_query(&filters);
        assert_eq!(clause, "WHERE num_employees >= $1");
        assert_eq!(params, vec![json!(0)]);
    }

    #[test]
    fn new_company_validation_aggregates_errors() {
        let data = CompanyNew {
            handle: String::new(),
            name: String::new(),
            description: None,
            num_employees: Some(-1),
            logo_url: Some("not a url".to_string()),
        };
        let err = data.validate().unwrap_err();
        match err {
            ApiError::Validation(errs) => assert_eq!(errs.len(), 4),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_company_passes() {
        let data = CompanyNew {
            handle: "c1".to_string(),
            name: "C1".to_string(),
            description: None,
            num_employees: Some(1),
            logo_url: Some("http://c1.img".to_string()),
        };
        assert!(data.validate().is_ok());
    }

    #[test]
    fn update_rejects_unknown_fields() {
        let result: Result<CompanyUpdate, _> =
            serde_json::from_value(json!({"handle": "other"}));
        assert!(result.is_err());
    }
}
