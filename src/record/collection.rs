//! Ordered, positionable cursors over query results.

use crate::error::AppError;
use crate::query::make_search_query;
use crate::record::Record;
use crate::schema::SchemaCache;
use crate::storage::Storage;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Zero or more records produced by one query, with a cursor. Iteration
/// order always matches the order of the underlying query.
#[derive(Clone, Debug)]
pub struct RecordCollection {
    records: Vec<Record>,
    position: usize,
}

impl RecordCollection {
    pub fn new(records: Vec<Record>) -> Self {
        RecordCollection {
            records,
            position: 0,
        }
    }

    /// Run a criteria search against `table` and materialize the matches.
    /// Empty/falsy criteria are dropped before the search is built.
    pub async fn search(
        storage: Arc<dyn Storage>,
        cache: SchemaCache,
        table: &str,
        criteria: &Map<String, Value>,
        order: &[String],
    ) -> Result<Self, AppError> {
        let schema = cache.table(&storage, table).await?;
        // only criteria that name real columns constrain the search
        let mut scoped = Map::new();
        for (key, value) in criteria {
            if let Some(canonical) = schema.canonical(key) {
                scoped.insert(canonical.to_string(), value.clone());
            }
        }
        let query = make_search_query(schema.table(), &scoped, order);
        let rows = storage.search(&query).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = Record::from_schema(storage.clone(), cache.clone(), schema.clone());
            record.bulk_assign(row)?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Current cursor element, if the cursor is in bounds.
    pub fn current(&self) -> Option<&Record> {
        self.records.get(self.position)
    }

    pub fn current_mut(&mut self) -> Option<&mut Record> {
        self.records.get_mut(self.position)
    }

    pub fn next(&mut self) {
        self.position += 1;
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Scan forward from the start until the cursor sits at `target`.
    /// A position that is not present is an out-of-bounds error.
    pub fn seek(&mut self, target: usize) -> Result<(), AppError> {
        self.rewind();
        while self.position < self.records.len() && self.position != target {
            self.next();
        }
        if self.position != target || target >= self.records.len() {
            return Err(AppError::OutOfBounds(target));
        }
        Ok(())
    }

    pub fn at(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Column lookup against the current cursor element.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.current().and_then(|record| record.get_value(name))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(record) = self.current_mut() {
            record.set(name, value);
        }
    }

    pub fn unset(&mut self, name: &str) {
        if let Some(record) = self.current_mut() {
            record.unset(name);
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.current()
            .map(|record| record.has(name))
            .unwrap_or(false)
    }

    /// Full data form: one raw data object per record, in query order.
    pub fn all(&self) -> Value {
        Value::Array(self.records.iter().map(Record::all).collect())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
