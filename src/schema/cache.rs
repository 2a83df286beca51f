//! Process-wide table metadata cache, populated once per table.

use crate::error::AppError;
use crate::schema::types::TableSchema;
use crate::storage::Storage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Shared cache of per-table column metadata. Cheap to clone; every clone
/// shares the same underlying map, so one cache serves the whole process.
/// Population is guarded per table key: concurrent first requests for the
/// same table perform a single metadata load.
#[derive(Clone, Default)]
pub struct SchemaCache {
    tables: Arc<Mutex<HashMap<String, Arc<OnceCell<Arc<TableSchema>>>>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (loading and memoizing on first use) the schema for `table`.
    /// A missing table surfaces as NotFound on every call; nothing is cached
    /// for it.
    pub async fn table(
        &self,
        storage: &Arc<dyn Storage>,
        table: &str,
    ) -> Result<Arc<TableSchema>, AppError> {
        let key = table.to_lowercase();
        let cell = {
            let mut tables = self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            tables.entry(key.clone()).or_default().clone()
        };
        let schema = cell
            .get_or_try_init(|| async {
                if !storage.has_table(&key).await? {
                    return Err(AppError::NotFound(format!("table does not exist: {table}")));
                }
                let columns = storage.columns_of(&key).await?;
                tracing::debug!(table = %key, columns = columns.len(), "schema loaded");
                Ok(Arc::new(TableSchema::new(&key, columns)))
            })
            .await?;
        Ok(schema.clone())
    }
}
