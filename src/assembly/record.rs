//! Data records fed into the template engine.
//!
//! A record holds scalar fields plus at most one list field. The list field
//! lives apart from the scalars so it can never be substituted as a plain
//! placeholder; it only drives repeating-section expansion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single field value as collected from a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Null,
}

impl FieldValue {
    /// True for `Null` and for empty text.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Text used in place of a placeholder, falling back to `missing_value`.
    pub fn render(&self, missing_value: &str) -> String {
        if self.is_missing() {
            return missing_value.to_string();
        }
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number),
            Self::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Text(flag.to_string()),
            Value::Number(number) => number
                .as_f64()
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(number.to_string())),
            Value::String(text) => Self::Text(text.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// One entry of a list field (an invoice line, a duty, ...).
pub type RowRecord = BTreeMap<String, FieldValue>;

/// Build a row from `(name, value)` pairs.
pub fn row<K, V, I>(pairs: I) -> RowRecord
where
    K: Into<String>,
    V: Into<FieldValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// The designated list field of a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListField {
    pub key: String,
    pub rows: Vec<RowRecord>,
}

/// Scalar fields plus an optional list field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRecord {
    scalars: BTreeMap<String, FieldValue>,
    list: Option<ListField>,
}

impl DataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_list(mut self, key: impl Into<String>, rows: Vec<RowRecord>) -> Self {
        self.set_list(key, rows);
        self
    }

    /// Insert a scalar field. Writes to the list key are ignored.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        if self.is_list_key(&key) {
            log::warn!("Ignoring scalar write to list field '{}'", key);
            return;
        }
        self.scalars.insert(key, value.into());
    }

    /// Set the list field, dropping any scalar stored under the same key.
    pub fn set_list(&mut self, key: impl Into<String>, rows: Vec<RowRecord>) {
        let key = key.into();
        self.scalars.remove(&key);
        self.list = Some(ListField { key, rows });
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.scalars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.scalars.contains_key(key)
    }

    pub fn list_key(&self) -> Option<&str> {
        self.list.as_ref().map(|list| list.key.as_str())
    }

    pub fn is_list_key(&self, key: &str) -> bool {
        self.list_key() == Some(key)
    }

    /// Rows of the list field when it is stored under `key`.
    pub fn rows(&self, key: &str) -> &[RowRecord] {
        match &self.list {
            Some(list) if list.key == key => &list.rows,
            _ => &[],
        }
    }

    pub fn rows_mut(&mut self) -> Option<&mut Vec<RowRecord>> {
        self.list.as_mut().map(|list| &mut list.rows)
    }

    /// Build a record from a JSON object.
    ///
    /// The entry named `list_key` may be an array of objects or a string with
    /// a JSON-encoded array, as sent by multipart forms.
    pub fn from_json(map: &Map<String, Value>, list_key: Option<&str>) -> Self {
        let mut record = Self::new();

        for (key, value) in map {
            if Some(key.as_str()) == list_key {
                record.set_list(key.clone(), rows_from_json(key, value));
            } else {
                record.insert(key.clone(), FieldValue::from(value));
            }
        }

        if let Some(key) = list_key {
            if record.list.is_none() {
                record.set_list(key, Vec::new());
            }
        }

        record
    }
}

fn rows_from_json(key: &str, value: &Value) -> Vec<RowRecord> {
    let decoded;
    let items = match value {
        Value::Array(items) => items,
        Value::String(encoded) if encoded.trim().is_empty() => return Vec::new(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => {
                decoded = items;
                &decoded
            }
            _ => {
                log::warn!("List field '{}' is not a JSON array; treating as empty", key);
                return Vec::new();
            }
        },
        Value::Null => return Vec::new(),
        _ => {
            log::warn!("List field '{}' is not an array; treating as empty", key);
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(fields) => Some(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), FieldValue::from(value)))
                    .collect(),
            ),
            _ => {
                log::warn!("Skipping non-object row {} in list field '{}'", index, key);
                None
            }
        })
        .collect()
}
