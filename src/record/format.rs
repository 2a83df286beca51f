//! Input coercion and output formatting keyed by declared column type.

use crate::schema::DeclaredType;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;

/// Loose truthiness for dynamically typed values: null, false, zero, the
/// empty string, `"0"`, and empty collections are all false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// String form of a value without JSON quoting.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integer form of a value; 0 for anything non-numeric.
pub fn numeric(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::Bool(b) => *b as i64,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

pub fn float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => *b as i64 as f64,
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn number(f: f64) -> Value {
    Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::Number(0.into()))
}

/// Booleans are stored as 0/1 integers.
pub fn coerce_boolean(value: &Value) -> Value {
    Value::Number((truthy(value) as i64).into())
}

/// Strips currency punctuation and stores a float; unparseable input stores 0.
pub fn coerce_dollar(value: &Value) -> Value {
    let cleaned: String = value_to_string(value)
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    number(cleaned.trim().parse().unwrap_or(0.0))
}

/// Strips everything but digits and stores the result as a string.
pub fn coerce_phone(value: &Value) -> Value {
    let digits: String = value_to_string(value)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    Value::String(digits)
}

/// Stored-to-display formatting for one value of the given declared type.
pub fn format_output(declared: &DeclaredType, value: &Value) -> Value {
    match declared.base.as_str() {
        "set" => Value::Array(
            value_to_string(value)
                .to_lowercase()
                .split(',')
                .map(|token| Value::String(token.to_string()))
                .collect(),
        ),
        "boolean" => Value::Bool(truthy(value)),
        "dollar" => Value::String(format!("${:.2}", float(value))),
        "phone" => Value::String(format_phone(&value_to_string(value))),
        _ => value.clone(),
    }
}

/// Regroups the first six digits as `xxx-xxx-` and appends the remainder
/// untouched. Longstanding behavior: later digit groups are never reshaped,
/// and numbers shorter than six digits come back unchanged.
pub fn format_phone(raw: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(\d{3})(\d{3})").expect("hardwired pattern"));
    re.replace(raw, "${1}-${2}-").into_owned()
}
