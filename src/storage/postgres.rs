//! PostgreSQL storage backend: metadata from information_schema, hand-built
//! parameterized SQL for the row operations.

use crate::error::AppError;
use crate::query::SearchQuery;
use crate::schema::ColumnDescriptor;
use crate::storage::{Row, Storage};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgPool, PgRow, PgTypeInfo, Postgres};
use sqlx::{Database, Row as _};

pub struct PgStorage {
    pool: PgPool,
    schema: String,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage {
            pool,
            schema: "public".into(),
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    fn qualified(&self, table: &str) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(table))
    }
}

/// Quote identifier for PostgreSQL (safe: only from loaded metadata).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// A value that can be bound to a PostgreSQL query. Converts from
/// serde_json::Value.
#[derive(Clone, Debug)]
enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Json(Value),
}

impl PgBindValue {
    fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else {
                    PgBindValue::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<i32> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

fn row_to_json(row: &PgRow) -> Row {
    use sqlx::Column;
    let mut map = Row::new();
    for col in row.columns() {
        map.insert(col.name().to_string(), cell_to_value(row, col.name()));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}

/// Collapse information_schema type spellings onto the declared-type names
/// the coercion tables understand.
fn declared_from_pg(data_type: &str, udt_name: &str, max_len: Option<i32>) -> String {
    let base = match data_type {
        "character varying" => "varchar",
        "character" => "char",
        "timestamp without time zone" | "timestamp with time zone" => "timestamp",
        "double precision" => "double",
        "USER-DEFINED" => udt_name,
        other => other,
    };
    match max_len {
        Some(n) if n > 0 => format!("{base}({n})"),
        _ => base.to_string(),
    }
}

/// A plain literal default survives as a value; expression defaults (e.g.
/// `nextval(...)`, `NOW()`) carry no usable blank-record value.
fn parse_pg_default(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.contains('(') {
        return None;
    }
    let literal = raw.split("::").next().unwrap_or(raw).trim();
    if let Ok(n) = literal.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    if let Ok(f) = literal.parse::<f64>() {
        return serde_json::Number::from_f64(f).map(Value::Number);
    }
    Some(Value::String(literal.trim_matches('\'').to_string()))
}

#[async_trait]
impl Storage for PgStorage {
    async fn has_table(&self, table: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn columns_of(&self, table: &str) -> Result<Vec<ColumnDescriptor>, AppError> {
        let rows = sqlx::query(
            "SELECT column_name, data_type, udt_name, character_maximum_length, column_default, is_nullable \
             FROM information_schema.columns WHERE table_schema = $1 AND table_name = $2 \
             ORDER BY ordinal_position",
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("table does not exist: {table}")));
        }
        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let udt_name: String = row.try_get("udt_name")?;
            let max_len: Option<i32> = row.try_get("character_maximum_length")?;
            let default: Option<String> = row.try_get("column_default")?;
            let is_nullable: String = row.try_get("is_nullable")?;
            let mut column =
                ColumnDescriptor::new(&name, &declared_from_pg(&data_type, &udt_name, max_len));
            column.nullable = is_nullable == "YES";
            column.default = default.as_deref().and_then(parse_pg_default);
            columns.push(column);
        }
        Ok(columns)
    }

    async fn load(
        &self,
        table: &str,
        id_column: &str,
        id: i64,
    ) -> Result<Option<Row>, AppError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1 LIMIT 1",
            self.qualified(table),
            quoted(id_column)
        );
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    async fn insert(
        &self,
        table: &str,
        id_column: Option<&str>,
        data: &Row,
    ) -> Result<Option<i64>, AppError> {
        let mut cols = Vec::with_capacity(data.len());
        let mut placeholders = Vec::with_capacity(data.len());
        let mut params = Vec::with_capacity(data.len());
        for (i, (name, value)) in data.iter().enumerate() {
            cols.push(quoted(name));
            placeholders.push(format!("${}", i + 1));
            params.push(PgBindValue::from_json(value));
        }
        let sql = match id_column {
            Some(id_column) => format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                self.qualified(table),
                cols.join(", "),
                placeholders.join(", "),
                quoted(id_column)
            ),
            None => format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.qualified(table),
                cols.join(", "),
                placeholders.join(", ")
            ),
        };
        tracing::debug!(sql = %sql, "query");
        if id_column.is_some() {
            let mut query = sqlx::query_scalar::<_, i64>(&sql);
            for param in params {
                query = query.bind(param);
            }
            let id = query.fetch_one(&self.pool).await?;
            Ok(Some(id))
        } else {
            let mut query = sqlx::query(&sql);
            for param in params {
                query = query.bind(param);
            }
            query.execute(&self.pool).await?;
            Ok(None)
        }
    }

    async fn update(
        &self,
        table: &str,
        id_column: &str,
        id: i64,
        data: &Row,
    ) -> Result<(), AppError> {
        if data.is_empty() {
            return Ok(());
        }
        let mut sets = Vec::with_capacity(data.len());
        let mut params = Vec::with_capacity(data.len());
        for (i, (name, value)) in data.iter().enumerate() {
            sets.push(format!("{} = ${}", quoted(name), i + 1));
            params.push(PgBindValue::from_json(value));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            self.qualified(table),
            sets.join(", "),
            quoted(id_column),
            params.len() + 1
        );
        tracing::debug!(sql = %sql, id, "query");
        let mut query = sqlx::query(&sql);
        for param in params {
            query = query.bind(param);
        }
        query.bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id_column: &str, id: i64) -> Result<(), AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            self.qualified(table),
            quoted(id_column)
        );
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Row>, AppError> {
        let mut where_parts = Vec::new();
        let mut params = Vec::new();
        for (column, value) in &query.criteria {
            match value {
                // an array criterion expands to IN (...)
                Value::Array(options) => {
                    let mut slots = Vec::with_capacity(options.len());
                    for option in options {
                        params.push(PgBindValue::from_json(option));
                        slots.push(format!("${}", params.len()));
                    }
                    where_parts.push(format!("{} IN ({})", quoted(column), slots.join(", ")));
                }
                other => {
                    params.push(PgBindValue::from_json(other));
                    where_parts.push(format!("{} = ${}", quoted(column), params.len()));
                }
            }
        }
        let where_clause = if where_parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_parts.join(" AND "))
        };
        let order_clause = if query.order.is_empty() {
            String::new()
        } else {
            format!(
                " ORDER BY {}",
                query
                    .order
                    .iter()
                    .map(|c| quoted(c))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        let sql = format!(
            "SELECT * FROM {}{}{}",
            self.qualified(&query.table),
            where_clause,
            order_clause
        );
        tracing::debug!(sql = %sql, "query");
        let mut q = sqlx::query(&sql);
        for param in params {
            q = q.bind(param);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}
