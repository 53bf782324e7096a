use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};

use crate::error::ApiError;

/// Build a parameterized `SET` fragment from a sparse update payload.
///
/// `data` maps field names to new values; fields listed in `column_overrides`
/// are translated to their column name, everything else passes through
/// unchanged. Only trusted identifiers may reach this function: data values
/// are never interpolated, they travel through the positional placeholders.
///
/// Fails with a bad-request error when `data` is empty. Updating nothing is a
/// caller bug, not a no-op.
pub fn sql_for_partial_update(
    data: &Map<String, Value>,
    column_overrides: &[(&str, &str)],
) -> Result<(String, Vec<Value>), ApiError> {
    if data.is_empty() {
        return Err(ApiError::bad_request("No data"));
    }

    let mut columns = Vec::with_capacity(data.len());
    let mut values = Vec::with_capacity(data.len());
    for (field, value) in data {
        let column = column_overrides
            .iter()
            .find(|(name, _)| *name == field.as_str())
            .map(|(_, column)| *column)
            .unwrap_or(field.as_str());
        values.push(value.clone());
        columns.push(format!("\"{}\" = ${}", column, values.len()));
    }

    Ok((columns.join(", "), values))
}

/// Serialize an update DTO into its sparse field map. Absent fields are
/// skipped by the DTO's serde attributes, so only supplied fields remain.
pub fn to_field_map<T: Serialize>(data: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::internal("update payload must be an object")),
        Err(e) => {
            tracing::error!("failed to serialize update payload: {}", e);
            Err(ApiError::internal("Failed to process update"))
        }
    }
}

/// Composes optional `WHERE` predicates in push order. Placeholder indices
/// are assigned internally, contiguous from `$1`, so callers never track
/// them by hand.
#[derive(Debug, Default)]
pub struct WhereBuilder {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column >= $n`
    pub fn gte(&mut self, column: &str, value: impl Into<Value>) {
        self.comparison(column, ">=", value.into());
    }

    /// `column <= $n`
    pub fn lte(&mut self, column: &str, value: impl Into<Value>) {
        self.comparison(column, "<=", value.into());
    }

    /// Case-insensitive substring match; wraps the needle in `%...%`.
    pub fn ilike_contains(&mut self, column: &str, needle: &str) {
        self.params.push(Value::String(format!("%{}%", needle)));
        self.clauses.push(format!("{} ILIKE ${}", column, self.params.len()));
    }

    /// Predicate with no bound value, e.g. `equity > 0`.
    pub fn literal(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    fn comparison(&mut self, column: &str, op: &str, value: Value) {
        self.params.push(value);
        self.clauses
            .push(format!("{} {} ${}", column, op, self.params.len()));
    }

    /// `WHERE a AND b ...` (empty string when no predicates were pushed) plus
    /// the positional values matching its placeholders.
    pub fn build(self) -> (String, Vec<Value>) {
        if self.clauses.is_empty() {
            (String::new(), self.params)
        } else {
            (format!("WHERE {}", self.clauses.join(" AND ")), self.params)
        }
    }
}

/// Bind a JSON parameter onto a typed query. Only the shapes the models
/// produce are supported: null, bool, integer, float, string.
pub fn bind_value<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    value: &'q Value,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s),
        other => {
            tracing::warn!("unsupported bind parameter shape: {}", other);
            query
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn empty_update_is_a_caller_error() {
        let err = sql_for_partial_update(&Map::new(), &[]).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "No data");
    }

    #[test]
    fn single_field_passes_through() {
        let (set_cols, values) =
            sql_for_partial_update(&map(json!({"name": "NewCo"})), &[]).unwrap();
        assert_eq!(set_cols, "\"name\" = $1");
        assert_eq!(values, vec![json!("NewCo")]);
    }

    #[test]
    fn overrides_translate_and_others_pass_through() {
        // serde_json maps iterate in key order: logoUrl, name, numEmployees
        let data = map(json!({
            "name": "NewCo",
            "numEmployees": 12,
            "logoUrl": "http://new.img",
        }));
        let overrides = [("numEmployees", "num_employees"), ("logoUrl", "logo_url")];
        let (set_cols, values) = sql_for_partial_update(&data, &overrides).unwrap();
        assert_eq!(
            set_cols,
            "\"logo_url\" = $1, \"name\" = $2, \"num_employees\" = $3"
        );
        assert_eq!(values, vec![json!("http://new.img"), json!("NewCo"), json!(12)]);
    }

    #[test]
    fn placeholders_are_contiguous_from_one() {
        let data = map(json!({"a": 1, "b": 2, "c": 3, "d": 4}));
        let (set_cols, values) = sql_for_partial_update(&data, &[]).unwrap();
        for idx in 1..=values.len() {
            assert!(set_cols.contains(&format!("${}", idx)), "missing ${}", idx);
        }
        assert!(!set_cols.contains(&format!("${}", values.len() + 1)));
    }

    #[test]
    fn empty_builder_yields_empty_clause() {
        let (clause, params) = WhereBuilder::new().build();
        assert_eq!(clause, "");
        assert!(params.is_empty());
    }

    #[test]
    fn predicates_join_with_and_in_push_order() {
        let mut builder = WhereBuilder::new();
        builder.gte("num_employees", 2);
        builder.lte("num_employees", 10);
        builder.ilike_contains("name", "net");
        let (clause, params) = builder.build();
        assert_eq!(
            clause,
            "WHERE num_employees >= $1 AND num_employees <= $2 AND name ILIKE $3"
        );
        assert_eq!(params, vec![json!(2), json!(10), json!("%net%")]);
    }

    #[test]
    fn literal_predicates_consume_no_placeholder() {
        let mut builder = WhereBuilder::new();
        builder.literal("equity > 0");
        builder.gte("salary", 1000);
        let (clause, params) = builder.build();
        assert_eq!(clause, "WHERE equity > 0 AND salary >= $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn placeholder_count_equals_param_count_for_all_combinations() {
        // Exercise every presence combination of three optional filters.
        for bits in 0..8u8 {
            let mut builder = WhereBuilder::new();
            if bits & 1 != 0 {
                builder.ilike_contains("title", "eng");
            }
            if bits & 2 != 0 {
                builder.gte("salary", 0);
            }
            if bits & 4 != 0 {
                builder.literal("equity > 0");
            }
            let (clause, params) = builder.build();
            let placeholder_count = clause.matches('$').count();
            assert_eq!(placeholder_count, params.len(), "combination {:03b}", bits);
            for idx in 1..=params.len() {
                assert!(clause.contains(&format!("${}", idx)), "combination {:03b}", bits);
            }
        }
    }

    #[test]
    fn field_map_drops_absent_fields() {
        #[derive(Serialize)]
        struct Sparse {
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            salary: Option<i32>,
        }
        let fields = to_field_map(&Sparse {
            name: Some("x".to_string()),
            salary: None,
        })
        .unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("name"));
    }
}
