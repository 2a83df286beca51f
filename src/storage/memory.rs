//! In-process storage backend for tests and demos.

use crate::error::AppError;
use crate::query::SearchQuery;
use crate::record::format;
use crate::schema::{ColumnDescriptor, TableSchema};
use crate::storage::{Row, Storage};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

struct MemTable {
    columns: Vec<ColumnDescriptor>,
    id_column: Option<String>,
    rows: BTreeMap<i64, Row>,
    next_id: i64,
}

/// Table data held entirely in process memory. Rows are keyed by identity;
/// inserts assign monotonically increasing ids.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, MemTable>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table definition. The identity column is discovered the
    /// same way the schema layer does it: a column answering to `id` or
    /// `<table>id`.
    pub fn define_table(&self, table: &str, columns: Vec<ColumnDescriptor>) {
        let schema = TableSchema::new(table, columns.clone());
        let id_column = schema.id_column().map(str::to_string);
        let mut tables = self.write();
        tables.insert(
            table.to_lowercase(),
            MemTable {
                columns,
                id_column,
                rows: BTreeMap::new(),
                next_id: 1,
            },
        );
    }

    /// Seed rows directly, assigning ids for rows that carry none.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        let mut tables = self.write();
        let Some(table) = tables.get_mut(&table.to_lowercase()) else {
            return;
        };
        for mut row in rows {
            let id = table
                .id_column
                .as_ref()
                .and_then(|column| row.get(column.as_str()))
                .map(format::numeric)
                .filter(|id| *id > 0)
                .unwrap_or(table.next_id);
            if let Some(column) = &table.id_column {
                row.insert(column.clone(), Value::Number(id.into()));
            }
            table.next_id = table.next_id.max(id + 1);
            table.rows.insert(id, row);
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, MemTable>> {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, MemTable>> {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Loose equality for criteria matching: numeric when both sides read as
/// numbers, string comparison otherwise. Arrays mean "any of".
fn criterion_matches(stored: &Value, wanted: &Value) -> bool {
    if let Value::Array(options) = wanted {
        return options.iter().any(|option| criterion_matches(stored, option));
    }
    match (stored, wanted) {
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            format::float(stored) == format::float(wanted)
        }
        _ => format::value_to_string(stored) == format::value_to_string(wanted),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => format::float(a)
            .partial_cmp(&format::float(b))
            .unwrap_or(Ordering::Equal),
        _ => format::value_to_string(a).cmp(&format::value_to_string(b)),
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn has_table(&self, table: &str) -> Result<bool, AppError> {
        Ok(self.read().contains_key(&table.to_lowercase()))
    }

    async fn columns_of(&self, table: &str) -> Result<Vec<ColumnDescriptor>, AppError> {
        let tables = self.read();
        tables
            .get(&table.to_lowercase())
            .map(|t| t.columns.clone())
            .ok_or_else(|| AppError::NotFound(format!("table does not exist: {table}")))
    }

    async fn load(
        &self,
        table: &str,
        _id_column: &str,
        id: i64,
    ) -> Result<Option<Row>, AppError> {
        let tables = self.read();
        let table = tables
            .get(&table.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("table does not exist: {table}")))?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn insert(
        &self,
        table: &str,
        id_column: Option<&str>,
        data: &Row,
    ) -> Result<Option<i64>, AppError> {
        let mut tables = self.write();
        let table = tables
            .get_mut(&table.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("table does not exist: {table}")))?;
        let id = table.next_id;
        table.next_id += 1;
        let mut row = data.clone();
        if let Some(column) = id_column.or(table.id_column.as_deref()) {
            row.insert(column.to_string(), Value::Number(id.into()));
        }
        table.rows.insert(id, row);
        Ok(Some(id))
    }

    async fn update(
        &self,
        table: &str,
        _id_column: &str,
        id: i64,
        data: &Row,
    ) -> Result<(), AppError> {
        let mut tables = self.write();
        let table = tables
            .get_mut(&table.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("table does not exist: {table}")))?;
        let row = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("row {id} not found")))?;
        for (key, value) in data {
            row.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete(&self, table: &str, _id_column: &str, id: i64) -> Result<(), AppError> {
        let mut tables = self.write();
        let table = tables
            .get_mut(&table.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("table does not exist: {table}")))?;
        table.rows.remove(&id);
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Row>, AppError> {
        let tables = self.read();
        let table = tables
            .get(&query.table.to_lowercase())
            .ok_or_else(|| AppError::NotFound(format!("table does not exist: {}", query.table)))?;
        let mut rows: Vec<Row> = table
            .rows
            .values()
            .filter(|row| {
                query.criteria.iter().all(|(column, wanted)| {
                    row.get(column.as_str())
                        .map(|stored| criterion_matches(stored, wanted))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect();
        for column in query.order.iter().rev() {
            rows.sort_by(|a, b| {
                let left = a.get(column.as_str()).unwrap_or(&Value::Null);
                let right = b.get(column.as_str()).unwrap_or(&Value::Null);
                compare_values(left, right)
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::make_search_query;
    use serde_json::{json, Map};

    fn storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.define_table(
            "widget",
            vec![
                ColumnDescriptor::new("ID", "int"),
                ColumnDescriptor::new("Name", "varchar(40)"),
                ColumnDescriptor::new("Size", "int"),
            ],
        );
        storage
    }

    fn row(name: &str, size: i64) -> Row {
        let mut row = Map::new();
        row.insert("Name".into(), json!(name));
        row.insert("Size".into(), json!(size));
        row
    }

    #[tokio::test]
    async fn inserts_assign_increasing_ids() {
        let storage = storage();
        let first = storage.insert("widget", Some("ID"), &row("Bolt", 3)).await.unwrap();
        let second = storage.insert("widget", Some("ID"), &row("Nut", 1)).await.unwrap();
        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
        let loaded = storage.load("widget", "ID", 2).await.unwrap().unwrap();
        assert_eq!(loaded.get("Name"), Some(&json!("Nut")));
    }

    #[tokio::test]
    async fn search_filters_and_orders() {
        let storage = storage();
        storage.seed(
            "widget",
            vec![row("Bolt", 3), row("Nut", 1), row("Washer", 3)],
        );
        let mut criteria = Map::new();
        criteria.insert("Size".into(), json!(3));
        let query = make_search_query("widget", &criteria, &["Name".into()]);
        let rows = storage.search(&query).await.unwrap();
        let names: Vec<&Value> = rows.iter().filter_map(|r| r.get("Name")).collect();
        assert_eq!(names, vec![&json!("Bolt"), &json!("Washer")]);
    }

    #[tokio::test]
    async fn array_criterion_means_any_of() {
        let storage = storage();
        storage.seed(
            "widget",
            vec![row("Bolt", 3), row("Nut", 1), row("Washer", 2)],
        );
        let mut criteria = Map::new();
        criteria.insert("Size".into(), json!([1, 2]));
        let query = make_search_query("widget", &criteria, &["ID".into()]);
        let rows = storage.search(&query).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let storage = storage();
        let err = storage.columns_of("gadget").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
