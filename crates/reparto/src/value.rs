// File: src/value.rs
// Purpose: Dynamically typed SQL values and result rows

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Format SQLite uses for `CURRENT_TIMESTAMP`
pub const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single SQL value, bound as a parameter or read back from a column
///
/// Mirrors SQLite's storage classes. Serializes untagged, so JSON `1`,
/// `1.5`, `"mask"`, `null` and `[1, 2]` map to the obvious variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parses a text column written by `CURRENT_TIMESTAMP`
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        self.as_str()
            .and_then(|s| NaiveDateTime::parse_from_str(s, SQLITE_TIMESTAMP_FORMAT).ok())
    }

    /// Converts a JSON value into a bindable SQL value
    ///
    /// Booleans become 0/1; arrays and objects are stored as their JSON text.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Integer(i64::from(*b)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .unwrap_or_else(|| Value::Real(n.as_f64().unwrap_or_default())),
            JsonValue::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Real(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(i64::from(b))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Blob(bytes)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One result row: column names and values in select order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column position
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of a named column
    pub fn get_by_name(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Converts the row into a JSON object keyed by column name
    pub fn to_json(&self) -> JsonValue {
        let object: Map<String, JsonValue> = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| {
                let json = serde_json::to_value(value).unwrap_or(JsonValue::Null);
                (column.clone(), json)
            })
            .collect();
        JsonValue::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(1), Value::Integer(1));
        assert_eq!(Value::from(2_i64), Value::Integer(2));
        assert_eq!(Value::from(1.5), Value::Real(1.5));
        assert_eq!(Value::from("mask"), Value::Text("mask".to_string()));
        assert_eq!(Value::from(true), Value::Integer(1));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("gloves")), Value::Text("gloves".to_string()));
        assert_eq!(Value::from(vec![1_u8, 2]), Value::Blob(vec![1, 2]));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(3).as_i64(), Some(3));
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Text("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Text("x".into()).as_i64(), None);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_as_datetime() {
        let value = Value::Text("2020-04-01 10:30:00".to_string());
        let parsed = value.as_datetime().unwrap();
        assert_eq!(parsed.format("%H:%M").to_string(), "10:30");

        assert!(Value::Text("yesterday".into()).as_datetime().is_none());
        assert!(Value::Integer(0).as_datetime().is_none());
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
        assert_eq!(Value::from_json(&json!(7)), Value::Integer(7));
        assert_eq!(Value::from_json(&json!(0.25)), Value::Real(0.25));
        assert_eq!(Value::from_json(&json!(false)), Value::Integer(0));
        assert_eq!(Value::from_json(&json!("mask")), Value::Text("mask".into()));
        assert_eq!(Value::from_json(&json!([1, 2])), Value::Text("[1,2]".into()));
    }

    #[test]
    fn test_untagged_serde() {
        assert_eq!(serde_json::to_value(Value::Integer(1)).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!(null));

        let parsed: Value = serde_json::from_value(json!("mask")).unwrap();
        assert_eq!(parsed, Value::Text("mask".into()));
        let parsed: Value = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(parsed, Value::Integer(42));
    }

    #[test]
    fn test_row_lookup_and_json() {
        let row = Row::new(
            vec!["id".into(), "name".into()],
            vec![Value::Integer(1), Value::from("mask")],
        );

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&Value::Integer(1)));
        assert_eq!(row.get_by_name("name"), Some(&Value::from("mask")));
        assert_eq!(row.get_by_name("missing"), None);
        assert_eq!(row.to_json(), json!({"id": 1, "name": "mask"}));
    }
}
