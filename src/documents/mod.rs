//! Stored documents: uploaded or generated files plus the form data they
//! were built from.

pub mod handlers;
pub mod models;
pub mod multipart_parser;
pub mod persistence;

pub use models::DocumentRecord;
