//! Extracted records: nested mappings built by dotted-path assignment.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// A nested mapping from field names to scalar values.
///
/// Field rules write into a record through dotted paths such as
/// `"cliente.endereco"`; intermediate objects are created as needed.
/// `serde_json::Map` keeps keys in sorted order without the
/// `preserve_order` feature, so consumers must not rely on key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a value at a dotted path, creating intermediate objects.
    ///
    /// A non-object value sitting where an intermediate object is needed
    /// is replaced; the last write wins, as in the rule engine's
    /// incremental assignment model.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let mut current = &mut self.0;
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                current.insert(part.to_string(), value.into());
                return;
            }
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| json!({}));
            if !entry.is_object() {
                *entry = json!({});
            }
            current = entry.as_object_mut().unwrap();
        }
    }

    /// Assign only if the path is currently absent.
    pub fn set_default(&mut self, path: &str, value: impl Into<Value>) {
        if self.get(path).is_none() {
            self.set(path, value);
        }
    }

    /// Read the value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current: &Value = &Value::Null;
        let mut map = Some(&self.0);
        for part in path.split('.') {
            current = map?.get(part)?;
            map = current.as_object();
        }
        Some(current)
    }

    /// Read a string value at a dotted path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Read a numeric value at a dotted path.
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// Whether any value (including null) is present at the path.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Whether the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutably borrow the underlying map.
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
