//! Extracted records
//!
//! A record is an insertion-ordered map from field name to a JSON value.
//! Only non-empty values are ever stored: inserting an empty string, null,
//! empty list or empty object is a no-op.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One extracted entity (company, tool, startup, officer)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Inserts a trimmed string value; returns false if it was empty
    pub fn insert_text(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.0.insert(key.to_string(), Value::String(value.to_string()));
        true
    }

    /// Inserts any value, dropping empty ones; returns false if dropped
    pub fn insert_value(&mut self, key: &str, value: Value) -> bool {
        if is_empty_value(&value) {
            return false;
        }
        self.0.insert(key.to_string(), value);
        true
    }

    /// Inserts a trimmed string value unless the key is already present
    pub fn insert_text_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.insert_text(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value of `key` if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes a field, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values_are_dropped() {
        let mut record = Record::new();
        assert!(!record.insert_text("title", "   "));
        assert!(!record.insert_value("logo", Value::Null));
        assert!(!record.insert_value("socials", json!({})));
        assert!(!record.insert_value("appointments", json!([])));
        assert!(record.is_empty());
    }

    #[test]
    fn test_text_is_trimmed() {
        let mut record = Record::new();
        record.insert_text("title", "  SubWatch \n");
        assert_eq!(record.get_str("title"), Some("SubWatch"));
    }

    #[test]
    fn test_false_is_kept() {
        let mut record = Record::new();
        assert!(record.insert_value("for_sale", Value::Bool(false)));
        assert_eq!(record.get("for_sale"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut record = Record::new();
        record.insert_text("source", "betalist");
        record.insert_text("url", "https://betalist.com/");
        record.insert_text("scraped_at", "2025-11-18T10:00:00.000Z");
        record.insert_text("title", "SubWatch");

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["source", "url", "scraped_at", "title"]);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"source":"betalist","url""#));
    }

    #[test]
    fn test_insert_if_absent() {
        let mut record = Record::new();
        record.insert_text("status", "Active");
        assert!(!record.insert_text_if_absent("status", "Dissolved"));
        assert!(record.insert_text_if_absent("nationality", "British"));
        assert_eq!(record.get_str("status"), Some("Active"));
    }
}
