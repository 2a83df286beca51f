//! Column descriptors and per-table schema shared by every record of a table.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Parsed declared column type: lower-cased base name plus parameter tokens.
///
/// `enum('A','B')` parses to base `enum` with params `["a", "b"]`;
/// `varchar(40)` parses to base `varchar` with params `["40"]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeclaredType {
    pub base: String,
    pub params: Vec<String>,
}

impl DeclaredType {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once('(') {
            Some((base, rest)) => {
                let inner = rest.trim_end_matches(')');
                let params = inner
                    .split(',')
                    .map(|p| p.trim().trim_matches('\'').to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect();
                DeclaredType {
                    base: base.trim().to_lowercase(),
                    params,
                }
            }
            None => DeclaredType {
                base: raw.to_lowercase(),
                params: Vec::new(),
            },
        }
    }

    /// Types whose parameter list enumerates the permitted tokens.
    pub fn is_listable(&self) -> bool {
        self.base == "set" || self.base == "enum"
    }
}

/// Static metadata for one column. Immutable once loaded and shared read-only
/// across all records of the table.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared: DeclaredType,
    pub default: Option<Value>,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: &str, declared: &str) -> Self {
        ColumnDescriptor {
            name: name.to_string(),
            declared: DeclaredType::parse(declared),
            default: None,
            nullable: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Initial value for a blank record: the metadata default when present,
    /// the declared type's zero value otherwise.
    pub fn default_value(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        match self.declared.base.as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "serial"
            | "boolean" => Value::Number(0.into()),
            "float" | "double" | "real" | "decimal" | "numeric" | "dollar" => {
                serde_json::Number::from_f64(0.0)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::Number(0.into()))
            }
            _ => Value::String(String::new()),
        }
    }
}

/// Column metadata for one table: the ordered descriptor list, the
/// case-insensitive alias table, and the identity column.
#[derive(Debug)]
pub struct TableSchema {
    table: String,
    columns: Vec<ColumnDescriptor>,
    alias: HashMap<String, String>,
    id_column: Option<String>,
}

impl TableSchema {
    /// Builds the alias table from the descriptor set. Besides the plain
    /// lower-cased aliases, a column named `<table>id` also answers to the
    /// bare alias `id`, so the identity column is discoverable whether it is
    /// spelled `ID` or `WidgetID`.
    pub fn new(table: &str, columns: Vec<ColumnDescriptor>) -> Self {
        let table = table.to_lowercase();
        let mut alias = HashMap::new();
        for column in &columns {
            alias.insert(column.name.to_lowercase(), column.name.clone());
        }
        if !alias.contains_key("id") {
            let prefixed = format!("{table}id");
            if let Some(canonical) = alias.get(&prefixed).cloned() {
                alias.insert("id".into(), canonical);
            }
        }
        let id_column = alias.get("id").cloned();
        TableSchema {
            table,
            columns,
            alias,
            id_column,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Descriptors in declaration order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Resolve any spelling of a column name to its canonical form.
    /// Unknown names resolve to None rather than an error.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.alias.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        let canonical = self.canonical(name)?;
        self.columns.iter().find(|c| c.name == canonical)
    }

    pub fn id_column(&self) -> Option<&str> {
        self.id_column.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_parameterized_types() {
        let t = DeclaredType::parse("enum('Open','Closed')");
        assert_eq!(t.base, "enum");
        assert_eq!(t.params, vec!["open", "closed"]);

        let t = DeclaredType::parse("varchar(40)");
        assert_eq!(t.base, "varchar");
        assert_eq!(t.params, vec!["40"]);

        let t = DeclaredType::parse("TEXT");
        assert_eq!(t.base, "text");
        assert!(t.params.is_empty());
    }

    #[test]
    fn alias_lookup_is_case_insensitive() {
        let schema = TableSchema::new(
            "widget",
            vec![
                ColumnDescriptor::new("ID", "int"),
                ColumnDescriptor::new("Name", "varchar(40)"),
            ],
        );
        assert_eq!(schema.canonical("name"), Some("Name"));
        assert_eq!(schema.canonical("NAME"), Some("Name"));
        assert_eq!(schema.canonical("missing"), None);
        assert_eq!(schema.id_column(), Some("ID"));
    }

    #[test]
    fn prefixed_identity_answers_to_bare_id() {
        let schema = TableSchema::new(
            "user",
            vec![
                ColumnDescriptor::new("UserID", "int"),
                ColumnDescriptor::new("Name", "varchar(40)"),
            ],
        );
        assert_eq!(schema.canonical("id"), Some("UserID"));
        assert_eq!(schema.id_column(), Some("UserID"));
    }

    #[test]
    fn defaults_fall_back_to_type_zero() {
        assert_eq!(ColumnDescriptor::new("Name", "varchar(40)").default_value(), json!(""));
        assert_eq!(ColumnDescriptor::new("OwnerID", "int").default_value(), json!(0));
        assert_eq!(ColumnDescriptor::new("Active", "boolean").default_value(), json!(0));
        assert_eq!(
            ColumnDescriptor::new("Status", "enum('a','b')")
                .with_default(json!("a"))
                .default_value(),
            json!("a")
        );
    }
}
