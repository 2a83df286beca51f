//! Dynamic records: one row's data exposed as a schema-driven field bag.
//!
//! A [`Record`] carries no compile-time knowledge of its table. Every field
//! access runs through an ordered resolution chain over the table's column
//! metadata: built-in accessors, `<name>ID` relations, then plain columns
//! with output formatting. Unknown names resolve to nothing instead of
//! erroring, which keeps callers working against loosely shaped input.

pub mod collection;
pub mod format;

use crate::error::AppError;
use crate::schema::{SchemaCache, TableSchema};
use crate::storage::Storage;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Custom write hook for one column; receives the coerced value after it has
/// been stored and may overwrite it.
pub type SetterHook = Arc<dyn Fn(&mut Record, &Value) + Send + Sync>;

/// Built-in computed accessor names, resolved ahead of columns.
const AUTO_GETTERS: &[&str] = &["all", "columns", "columnlist", "idcolumn", "table"];

/// A field produced by dynamic lookup: either a scalar value or a lazily
/// loaded related record.
#[derive(Clone)]
pub enum Field {
    Value(Value),
    Related(Box<Record>),
}

impl Field {
    pub fn into_value(self) -> Value {
        match self {
            Field::Value(value) => value,
            Field::Related(record) => record.all(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            Field::Related(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Field::Value(_) => None,
            Field::Related(record) => Some(record),
        }
    }
}

#[derive(Clone)]
pub struct Record {
    schema: Arc<TableSchema>,
    storage: Arc<dyn Storage>,
    cache: SchemaCache,
    data: HashMap<String, Value>,
    no_update: HashSet<String>,
    related: HashMap<String, Record>,
    auto_expand: HashMap<String, String>,
    setters: HashMap<String, SetterHook>,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.schema.table())
            .field("data", &self.data)
            .finish()
    }
}

impl Record {
    /// Blank record with every column defaulted from the table's metadata.
    /// Fails with NotFound when the table does not exist.
    pub async fn new(
        storage: Arc<dyn Storage>,
        cache: SchemaCache,
        table: &str,
    ) -> Result<Self, AppError> {
        let schema = cache.table(&storage, table).await?;
        Ok(Self::from_schema(storage, cache, schema))
    }

    pub(crate) fn from_schema(
        storage: Arc<dyn Storage>,
        cache: SchemaCache,
        schema: Arc<TableSchema>,
    ) -> Self {
        let mut data = HashMap::new();
        for column in schema.columns() {
            data.insert(column.name.clone(), column.default_value());
        }
        let no_update = schema
            .id_column()
            .map(str::to_string)
            .into_iter()
            .collect();
        Record {
            schema,
            storage,
            cache,
            data,
            no_update,
            related: HashMap::new(),
            auto_expand: HashMap::new(),
            setters: HashMap::new(),
        }
    }

    /// Build and load a record by identity in one step.
    pub async fn from_id(
        storage: Arc<dyn Storage>,
        cache: SchemaCache,
        table: &str,
        id: i64,
    ) -> Result<Self, AppError> {
        let mut record = Self::new(storage, cache, table).await?;
        record.load(id).await?;
        Ok(record)
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn id_column(&self) -> Option<&str> {
        self.schema.id_column()
    }

    /// Numeric identity value; 0 while the record has not been created.
    pub fn id(&self) -> i64 {
        self.id_column()
            .and_then(|column| self.data.get(column))
            .map(format::numeric)
            .unwrap_or(0)
    }

    /// A record is created once its identity column holds a positive value.
    /// From that point on, identity-designated columns reject writes.
    pub fn is_created(&self) -> bool {
        self.id() > 0
    }

    /// Number of columns carried by this record.
    pub fn len(&self) -> usize {
        self.schema.columns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.columns().is_empty()
    }

    /// Iterate (column, raw value) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.schema
            .columns()
            .iter()
            .filter_map(|column| self.data.get(&column.name).map(|v| (column.name.as_str(), v)))
    }

    /// Assign a field by any spelling of its name. Unresolved names are
    /// ignored, and identity columns are frozen once the record is created;
    /// neither case is an error. Resolved writes are coerced per the column's
    /// declared type before being stored.
    pub fn set(&mut self, name: &str, value: Value) {
        let Some(canonical) = self.schema.canonical(name).map(str::to_string) else {
            return;
        };
        if self.no_update.contains(&canonical) && self.is_created() {
            return;
        }
        let coerced = self.format_input(&canonical, value);
        self.data.insert(canonical.clone(), coerced.clone());
        if let Some(setter) = self.setters.get(&canonical).cloned() {
            (*setter)(self, &coerced);
        }
    }

    fn format_input(&self, canonical: &str, value: Value) -> Value {
        let Some(column) = self.schema.column(canonical) else {
            return value;
        };
        match column.declared.base.as_str() {
            "boolean" => format::coerce_boolean(&value),
            "dollar" => format::coerce_dollar(&value),
            "phone" => format::coerce_phone(&value),
            _ => self.storage.value_filter(&column.declared, value),
        }
    }

    /// Does `name` resolve to anything `get` could produce? Columns, the
    /// `title`→`name` alias, built-in accessors, `<name>ID` relations, and
    /// `<base>List` enumerations all count.
    pub fn has(&self, name: &str) -> bool {
        if self.schema.canonical(name).is_some() {
            return true;
        }
        let lower = name.to_lowercase();
        if lower == "title" && self.schema.canonical("name").is_some() {
            return true;
        }
        if AUTO_GETTERS.contains(&lower.as_str()) {
            return true;
        }
        if self.schema.canonical(&format!("{name}id")).is_some() {
            return true;
        }
        if let Some(base) = list_base(name) {
            return self.has(base);
        }
        false
    }

    /// Resolve a field through the full rule chain: built-in accessors, then
    /// `<name>ID` relations, then formatted column output. Absent names
    /// resolve to None rather than an error.
    pub async fn get(&mut self, name: &str) -> Option<Field> {
        let lower = name.to_lowercase();
        if let Some(value) = self.auto_getter(&lower) {
            return Some(Field::Value(value));
        }
        if self.schema.canonical(&format!("{name}id")).is_some() {
            if let Some(record) = self.related(name).await {
                return Some(Field::Related(Box::new(record)));
            }
        }
        if self.has(name) {
            return Some(Field::Value(self.format_output(name)));
        }
        None
    }

    /// Scalar lookup: built-in accessors and formatted column values only.
    /// Relations are resolved by [`Record::get`].
    pub fn get_value(&self, name: &str) -> Option<Value> {
        let lower = name.to_lowercase();
        if let Some(value) = self.auto_getter(&lower) {
            return Some(value);
        }
        if self.has(name) {
            return Some(self.format_output(name));
        }
        None
    }

    /// The related record behind the `<name>ID` column, loading and caching
    /// it on first access. A row that fails to load yields a blank record of
    /// the related table instead of an error; only a relation whose table
    /// does not exist at all resolves to None.
    pub async fn related(&mut self, name: &str) -> Option<Record> {
        let key = name.to_lowercase();
        if let Some(existing) = self.related.get(&key) {
            return Some(existing.clone());
        }
        let table = self
            .auto_expand
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.clone());
        let id = self
            .get_value(&format!("{name}id"))
            .map(|v| format::numeric(&v))
            .unwrap_or(0);
        let record = match Record::from_id(self.storage.clone(), self.cache.clone(), &table, id).await
        {
            Ok(record) => record,
            Err(_) => Record::new(self.storage.clone(), self.cache.clone(), &table)
                .await
                .ok()?,
        };
        self.related.insert(key.clone(), record.clone());
        Some(record)
    }

    fn auto_getter(&self, lower: &str) -> Option<Value> {
        match lower {
            "all" => Some(self.all()),
            "columns" => serde_json::to_value(self.schema.columns()).ok(),
            "columnlist" => Some(Value::Array(
                self.schema
                    .columns()
                    .iter()
                    .map(|c| Value::String(c.name.clone()))
                    .collect(),
            )),
            "idcolumn" => Some(Value::String(
                self.id_column().unwrap_or_default().to_string(),
            )),
            "table" => Some(Value::String(self.table().to_string())),
            _ => None,
        }
    }

    fn format_output(&self, name: &str) -> Value {
        // `<base>List` enumerates the tokens a set/enum column permits
        if let Some(base) = list_base(name) {
            if let Some(column) = self.schema.column(base) {
                if column.declared.is_listable() {
                    return Value::Array(
                        column
                            .declared
                            .params
                            .iter()
                            .map(|token| Value::String(token.clone()))
                            .collect(),
                    );
                }
            }
        }
        let column = self.schema.column(name).or_else(|| {
            if name.eq_ignore_ascii_case("title") {
                self.schema.column("name")
            } else {
                None
            }
        });
        let value = column
            .and_then(|c| self.data.get(&c.name))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        match column {
            Some(c) => format::format_output(&c.declared, &value),
            None => value,
        }
    }

    /// Reset a column (or the column behind a `<name>ID` relation name) to
    /// its default.
    pub fn unset(&mut self, name: &str) {
        let canonical = self
            .schema
            .canonical(name)
            .map(str::to_string)
            .or_else(|| self.schema.canonical(&format!("{name}id")).map(str::to_string));
        if let Some(canonical) = canonical {
            if let Some(column) = self.schema.column(&canonical) {
                self.data.insert(canonical, column.default_value());
            }
        }
    }

    /// Raw column data in declaration order.
    pub fn all(&self) -> Value {
        let mut map = Map::new();
        for column in self.schema.columns() {
            map.insert(
                column.name.clone(),
                self.data.get(&column.name).cloned().unwrap_or(Value::Null),
            );
        }
        Value::Object(map)
    }

    /// Column data with every value passed through output formatting.
    pub fn all_formatted(&self) -> Value {
        let mut map = Map::new();
        for column in self.schema.columns() {
            map.insert(column.name.clone(), self.format_output(&column.name));
        }
        Value::Object(map)
    }

    /// Assign every key that matches a column, consuming matches and
    /// returning the leftovers. A payload carrying the identity column is
    /// row data from storage and is stored verbatim; anything else is caller
    /// input and goes through [`Record::set`]. Reassigning a created record's
    /// identity to a different value is a Conflict.
    pub fn bulk_assign(
        &mut self,
        mut data: Map<String, Value>,
    ) -> Result<Map<String, Value>, AppError> {
        let mut trusted = false;
        if let Some(id_column) = self.id_column().map(str::to_string) {
            let id_key = data
                .keys()
                .find(|key| self.schema.canonical(key) == Some(id_column.as_str()))
                .cloned();
            if let Some(key) = id_key {
                trusted = true;
                let incoming = data.remove(&key).unwrap_or(Value::Null);
                if self.is_created() && format::numeric(&incoming) != self.id() {
                    return Err(AppError::Conflict(format!(
                        "the existing {} already has {} {} so it can't be changed to {}",
                        self.table(),
                        id_column,
                        self.id(),
                        format::numeric(&incoming)
                    )));
                }
                self.set(&id_column, incoming);
            }
        }
        let keys: Vec<String> = data.keys().cloned().collect();
        for key in keys {
            if self.schema.canonical(&key).is_none() {
                continue;
            }
            let Some(value) = data.remove(&key) else { continue };
            if trusted {
                let canonical = self
                    .schema
                    .canonical(&key)
                    .map(str::to_string)
                    .unwrap_or(key);
                self.data.insert(canonical, value);
            } else {
                self.set(&key, value);
            }
        }
        Ok(data)
    }

    /// Replace this record's data with the stored row for `id`. Missing rows
    /// are NotFound; storage failures bubble up unchanged.
    pub async fn load(&mut self, id: i64) -> Result<(), AppError> {
        let id_column = self
            .id_column()
            .ok_or_else(|| AppError::NotFound(format!("{} has no identity column", self.table())))?
            .to_string();
        let row = self
            .storage
            .load(self.table(), &id_column, id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "the table {} does not contain the {} {}",
                    self.table(),
                    id_column,
                    id
                ))
            })?;
        self.bulk_assign(row)?;
        Ok(())
    }

    /// Insert or update depending on whether the record has been created.
    /// Returns the record's identity.
    pub async fn save(&mut self) -> Result<i64, AppError> {
        if self.is_created() {
            self.update().await
        } else {
            self.create().await
        }
    }

    async fn create(&mut self) -> Result<i64, AppError> {
        let mut payload = match self.all() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let id_column = self.id_column().map(str::to_string);
        if let Some(id_column) = &id_column {
            payload.remove(id_column);
        }
        let id = self
            .storage
            .insert(self.table(), id_column.as_deref(), &payload)
            .await?
            .ok_or_else(|| {
                AppError::Storage(format!("insert into {} produced no id", self.table()))
            })?;
        if let Some(id_column) = id_column {
            self.data.insert(id_column, Value::Number(id.into()));
        }
        tracing::debug!(table = %self.table(), id, "record created");
        Ok(id)
    }

    async fn update(&mut self) -> Result<i64, AppError> {
        let id = self.id();
        let id_column = self
            .id_column()
            .filter(|_| id > 0)
            .ok_or_else(|| AppError::NotFound(format!("{} has no identity to update", self.table())))?
            .to_string();
        let mut payload = match self.all() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        payload.remove(&id_column);
        self.storage
            .update(self.table(), &id_column, id, &payload)
            .await?;
        Ok(id)
    }

    /// Delete the stored row. A record that was never created is a
    /// successful no-op.
    pub async fn delete(&mut self) -> Result<(), AppError> {
        if !self.is_created() {
            return Ok(());
        }
        let id = self.id();
        let id_column = self
            .id_column()
            .ok_or_else(|| AppError::NotFound(format!("{} has no identity column", self.table())))?
            .to_string();
        self.storage.delete(self.table(), &id_column, id).await
    }

    /// Route future writes of `column` through `hook` (after coercion).
    pub fn register_setter(&mut self, column: &str, hook: SetterHook) {
        if let Some(canonical) = self.schema.canonical(column).map(str::to_string) {
            self.setters.insert(canonical, hook);
        }
    }

    /// Expand the relation `name` against `table` instead of a table named
    /// after the relation itself.
    pub fn register_expansion(&mut self, name: &str, table: &str) {
        self.auto_expand
            .insert(name.to_lowercase(), table.to_lowercase());
    }

    /// Freeze `column` against writes once the record is created.
    pub fn freeze(&mut self, column: &str) {
        if let Some(canonical) = self.schema.canonical(column).map(str::to_string) {
            self.no_update.insert(canonical);
        }
    }
}

/// `StatusList` -> `Status`; None when the name carries no `List` suffix.
fn list_base(name: &str) -> Option<&str> {
    let idx = name.find("List")?;
    if idx == 0 {
        return None;
    }
    Some(&name[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;
    use crate::storage::memory::MemoryStorage;
    use serde_json::json;

    fn widget_storage() -> (Arc<dyn Storage>, SchemaCache) {
        let storage = MemoryStorage::new();
        storage.define_table(
            "widget",
            vec![
                ColumnDescriptor::new("ID", "int"),
                ColumnDescriptor::new("Name", "varchar(40)"),
                ColumnDescriptor::new("OwnerID", "int"),
                ColumnDescriptor::new("Price", "dollar"),
                ColumnDescriptor::new("Active", "boolean"),
                ColumnDescriptor::new("Status", "enum('Open','Closed')"),
                ColumnDescriptor::new("Phone", "phone"),
            ],
        );
        storage.define_table(
            "owner",
            vec![
                ColumnDescriptor::new("OwnerID", "int"),
                ColumnDescriptor::new("Name", "varchar(40)"),
            ],
        );
        (Arc::new(storage), SchemaCache::new())
    }

    async fn widget(storage: &Arc<dyn Storage>, cache: &SchemaCache) -> Record {
        Record::new(storage.clone(), cache.clone(), "Widget")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn blank_record_defaults_every_column() {
        let (storage, cache) = widget_storage();
        let record = widget(&storage, &cache).await;
        assert_eq!(record.get_value("Name"), Some(json!("")));
        assert_eq!(record.get_value("OwnerID"), Some(json!(0)));
        assert_eq!(record.id(), 0);
        assert!(!record.is_created());
        assert_eq!(record.len(), 7);
        let first = record.iter().next().unwrap();
        assert_eq!(first, ("ID", &json!(0)));
    }

    #[tokio::test]
    async fn set_coerces_and_get_formats() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.set("name", json!("Bolt"));
        assert_eq!(record.get_value("Name"), Some(json!("Bolt")));
        // title aliases name when no title column exists
        assert_eq!(record.get_value("Title"), Some(json!("Bolt")));

        record.set("Price", json!("$1,234.5"));
        assert_eq!(record.get_value("Price"), Some(json!("$1234.50")));

        record.set("Active", json!("yes"));
        assert_eq!(record.get_value("Active"), Some(json!(true)));

        record.set("Phone", json!("(859) 555-1234"));
        assert_eq!(record.get_value("Phone"), Some(json!("859-555-1234")));
    }

    #[tokio::test]
    async fn unresolved_writes_are_silently_ignored() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.set("NoSuchColumn", json!("x"));
        assert_eq!(record.get_value("NoSuchColumn"), None);
        assert!(!record.has("NoSuchColumn"));
    }

    #[tokio::test]
    async fn identity_rejects_writes_after_creation() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.set("Name", json!("Bolt"));
        let id = record.save().await.unwrap();
        assert!(id > 0);
        assert_eq!(record.id(), id);

        record.set("ID", json!(id + 10));
        assert_eq!(record.id(), id);
    }

    #[tokio::test]
    async fn frozen_columns_reject_writes_after_creation() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.freeze("Name");
        record.set("Name", json!("Bolt"));
        record.save().await.unwrap();
        record.set("Name", json!("Nut"));
        assert_eq!(record.get_value("Name"), Some(json!("Bolt")));
    }

    #[tokio::test]
    async fn bulk_assign_conflicts_on_identity_change() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.set("Name", json!("Bolt"));
        let id = record.save().await.unwrap();

        let mut data = Map::new();
        data.insert("ID".into(), json!(id + 1));
        let err = record.bulk_assign(data).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // the same identity is tolerated
        let mut data = Map::new();
        data.insert("ID".into(), json!(id));
        data.insert("Name".into(), json!("Nut"));
        record.bulk_assign(data).unwrap();
        assert_eq!(record.id(), id);
    }

    #[tokio::test]
    async fn bulk_assign_returns_leftovers() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        let mut data = Map::new();
        data.insert("Name".into(), json!("Bolt"));
        data.insert("Unrelated".into(), json!(1));
        let leftover = record.bulk_assign(data).unwrap();
        assert_eq!(leftover.len(), 1);
        assert!(leftover.contains_key("Unrelated"));
        assert_eq!(record.get_value("Name"), Some(json!("Bolt")));
    }

    #[tokio::test]
    async fn relation_resolves_to_empty_record_when_unset() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        let owner = record.get("Owner").await.unwrap();
        let owner = owner.as_record().unwrap();
        assert_eq!(owner.table(), "owner");
        assert_eq!(owner.id(), 0);
    }

    #[tokio::test]
    async fn relation_loads_and_caches_the_related_row() {
        let (storage, cache) = widget_storage();
        let mut owner = Record::new(storage.clone(), cache.clone(), "owner")
            .await
            .unwrap();
        owner.set("Name", json!("Ada"));
        let owner_id = owner.save().await.unwrap();

        let mut record = widget(&storage, &cache).await;
        record.set("OwnerID", json!(owner_id));
        let related = record.get("Owner").await.unwrap();
        assert_eq!(
            related.as_record().unwrap().get_value("Name"),
            Some(json!("Ada"))
        );
    }

    #[tokio::test]
    async fn has_agrees_with_get() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        for name in ["Name", "name", "Title", "Owner", "OwnerID", "StatusList", "idcolumn"] {
            assert!(record.has(name), "has({name})");
            assert!(record.get(name).await.is_some(), "get({name})");
        }
        assert!(!record.has("Bogus"));
        assert!(record.get("Bogus").await.is_none());
    }

    #[tokio::test]
    async fn list_accessor_enumerates_enum_tokens() {
        let (storage, cache) = widget_storage();
        let record = widget(&storage, &cache).await;
        assert_eq!(
            record.get_value("StatusList"),
            Some(json!(["open", "closed"]))
        );
    }

    #[tokio::test]
    async fn builtin_accessors() {
        let (storage, cache) = widget_storage();
        let record = widget(&storage, &cache).await;
        assert_eq!(record.get_value("table"), Some(json!("widget")));
        assert_eq!(record.get_value("idcolumn"), Some(json!("ID")));
        let list = record.get_value("columnlist").unwrap();
        assert_eq!(list.as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn save_inserts_then_updates() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.set("Name", json!("Bolt"));
        let id = record.save().await.unwrap();
        assert!(record.is_created());

        record.set("Name", json!("Nut"));
        let same = record.save().await.unwrap();
        assert_eq!(same, id);

        let loaded = Record::from_id(storage, cache, "widget", id).await.unwrap();
        assert_eq!(loaded.get_value("Name"), Some(json!("Nut")));
    }

    #[tokio::test]
    async fn delete_is_noop_before_creation() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.delete().await.unwrap();

        record.set("Name", json!("Bolt"));
        let id = record.save().await.unwrap();
        record.delete().await.unwrap();
        let missing = Record::from_id(storage, cache, "widget", id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn load_missing_row_is_not_found() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        let err = record.load(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn unset_restores_defaults() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.set("Name", json!("Bolt"));
        record.unset("Name");
        assert_eq!(record.get_value("Name"), Some(json!("")));

        record.set("OwnerID", json!(5));
        record.unset("Owner");
        assert_eq!(record.get_value("OwnerID"), Some(json!(0)));
    }

    #[tokio::test]
    async fn custom_setter_sees_the_coerced_value() {
        let (storage, cache) = widget_storage();
        let mut record = widget(&storage, &cache).await;
        record.register_setter(
            "Active",
            Arc::new(|record, coerced| {
                let flipped = json!(1 - format::numeric(coerced));
                record.data.insert("Active".into(), flipped);
            }),
        );
        record.set("Active", json!("yes"));
        assert_eq!(record.get_value("Active"), Some(json!(false)));
    }
}
