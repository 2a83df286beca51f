//! Search-statement construction from criteria maps.

use serde_json::{Map, Value};

/// A storage-bound search: one table, pruned equality criteria, ordering.
/// Criteria-to-predicate translation belongs to the storage collaborator;
/// an array criterion means "any of these values".
#[derive(Clone, Debug, Default)]
pub struct SearchQuery {
    pub table: String,
    pub criteria: Vec<(String, Value)>,
    pub order: Vec<String>,
}

/// True for values that mean "no constraint on this field".
pub fn is_empty_criterion(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Build the search statement for `table`, dropping empty/falsy criteria
/// first.
pub fn make_search_query(table: &str, criteria: &Map<String, Value>, order: &[String]) -> SearchQuery {
    let criteria = criteria
        .iter()
        .filter(|(_, value)| !is_empty_criterion(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    SearchQuery {
        table: table.to_string(),
        criteria,
        order: order.to_vec(),
    }
}
