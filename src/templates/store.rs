use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assembly::engine::placeholder_names;
use crate::assembly::DocumentType;

#[derive(Debug, Error)]
pub enum TemplateStoreError {
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("duplicate document type id '{0}'")]
    DuplicateId(String),
}

/// A document type together with its HTML content.
#[derive(Debug, Clone)]
pub struct StoredTemplate {
    pub doc_type: DocumentType,
    pub content: String,
}

impl StoredTemplate {
    pub fn new(doc_type: DocumentType, content: impl Into<String>) -> Self {
        Self {
            doc_type,
            content: content.into(),
        }
    }

    /// Placeholders in the content that the document type does not declare.
    pub fn undeclared_placeholders(&self) -> Vec<String> {
        placeholder_names(&self.content)
            .into_iter()
            .filter(|name| !self.doc_type.fields.iter().any(|field| &field.name == name))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct TemplateStore {
    entries: BTreeMap<String, StoredTemplate>,
}

impl TemplateStore {
    /// Read every document type's template file from `dir`.
    pub fn load(dir: &Path, types: Vec<DocumentType>) -> Result<Self, TemplateStoreError> {
        let mut entries = Vec::with_capacity(types.len());
        for doc_type in types {
            let path = dir.join(&doc_type.template_file);
            let content = fs::read_to_string(&path)
                .map_err(|source| TemplateStoreError::Read { path: path.clone(), source })?;
            log::info!("Loaded template '{}' from {}", doc_type.id, path.display());
            entries.push(StoredTemplate::new(doc_type, content));
        }
        Self::from_templates(entries)
    }

    pub fn from_templates(
        templates: impl IntoIterator<Item = StoredTemplate>,
    ) -> Result<Self, TemplateStoreError> {
        let mut entries = BTreeMap::new();
        for template in templates {
            let id = template.doc_type.id.clone();
            let undeclared = template.undeclared_placeholders();
            if !undeclared.is_empty() {
                log::debug!(
                    "Template '{}' uses derived or undeclared fields: {}",
                    id,
                    undeclared.join(", ")
                );
            }
            if entries.insert(id.clone(), template).is_some() {
                return Err(TemplateStoreError::DuplicateId(id));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&StoredTemplate> {
        self.entries.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &StoredTemplate> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
