use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub template_id: String,
    pub title: String,
    /// Download name shown to users
    pub filename: String,
    /// Blob name inside object storage
    pub stored_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    /// True when the file was produced from the template rather than uploaded
    pub generated: bool,
    pub fields: BTreeMap<String, String>,
    pub list_field: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Scalar fields and rows as the JSON object the assembly layer reads.
    pub fn form_data(&self) -> serde_json::Map<String, Value> {
        let mut data: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        if let Some(key) = &self.list_field {
            data.insert(key.clone(), Value::Array(self.rows.clone()));
        }
        data
    }
}

/// Blob name for a document: its id plus the extension of `filename`.
pub fn stored_name_for(id: Uuid, filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}.{}", id, ext.to_ascii_lowercase())
        }
        _ => id.to_string(),
    }
}
