//! Storage collaborator contract shared by the bundled backends.

pub mod memory;
pub mod postgres;

use crate::error::AppError;
use crate::query::SearchQuery;
use crate::record::format;
use crate::schema::{ColumnDescriptor, DeclaredType};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One stored row as loosely typed column data.
pub type Row = Map<String, Value>;

/// Everything the core asks of a backing store. Each persistence call is
/// independently atomic; the core never spans transactions across calls.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Does `table` exist in the underlying store?
    async fn has_table(&self, table: &str) -> Result<bool, AppError>;

    /// Ordered column metadata for `table`.
    async fn columns_of(&self, table: &str) -> Result<Vec<ColumnDescriptor>, AppError>;

    /// One row by identity, or None when absent.
    async fn load(&self, table: &str, id_column: &str, id: i64)
        -> Result<Option<Row>, AppError>;

    /// Insert a row, returning the generated identity when the store
    /// produces one.
    async fn insert(
        &self,
        table: &str,
        id_column: Option<&str>,
        data: &Row,
    ) -> Result<Option<i64>, AppError>;

    async fn update(
        &self,
        table: &str,
        id_column: &str,
        id: i64,
        data: &Row,
    ) -> Result<(), AppError>;

    async fn delete(&self, table: &str, id_column: &str, id: i64) -> Result<(), AppError>;

    /// Matching rows for a pruned criteria search, in query order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Row>, AppError>;

    /// Generic input coercion for declared types without a dedicated rule.
    fn value_filter(&self, declared: &DeclaredType, raw: Value) -> Value {
        generic_value_filter(declared, raw)
    }
}

/// Default declared-type coercion: integers, floats, and strings land in
/// their natural representation; set/enum values collapse to a comma-joined
/// token string; unrecognized types pass through untouched.
pub fn generic_value_filter(declared: &DeclaredType, raw: Value) -> Value {
    match declared.base.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "serial" => {
            Value::Number(format::numeric(&raw).into())
        }
        "float" | "double" | "real" | "decimal" | "numeric" => {
            serde_json::Number::from_f64(format::float(&raw))
                .map(Value::Number)
                .unwrap_or_else(|| Value::Number(0.into()))
        }
        "varchar" | "char" | "text" | "mediumtext" | "longtext" | "date" | "datetime"
        | "timestamp" | "time" | "password" => Value::String(format::value_to_string(&raw)),
        "set" | "enum" => match raw {
            Value::Array(items) => Value::String(
                items
                    .iter()
                    .map(format::value_to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => Value::String(format::value_to_string(&other)),
        },
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_coerces_by_declared_type() {
        let int = DeclaredType::parse("int");
        assert_eq!(generic_value_filter(&int, json!("42")), json!(42));
        assert_eq!(generic_value_filter(&int, json!("junk")), json!(0));

        let text = DeclaredType::parse("varchar(40)");
        assert_eq!(generic_value_filter(&text, json!(7)), json!("7"));

        let set = DeclaredType::parse("set('a','b')");
        assert_eq!(generic_value_filter(&set, json!(["a", "b"])), json!("a,b"));

        let unknown = DeclaredType::parse("geometry");
        assert_eq!(generic_value_filter(&unknown, json!([1, 2])), json!([1, 2]));
    }
}
