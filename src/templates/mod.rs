//! Template store: bundled HTML templates and their document types.

pub mod handlers;
pub mod models;
pub mod store;

pub use store::{StoredTemplate, TemplateStore, TemplateStoreError};
