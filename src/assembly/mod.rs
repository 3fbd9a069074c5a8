//! Document assembly: turning an HTML template plus form data into a filled
//! document.
//!
//! - `engine` - placeholder substitution and repeating-section expansion
//! - `record` - typed data records (scalar fields + one list field)
//! - `section` - row renderers for repeating sections
//! - `totals` - line-item arithmetic feeding the scalar pass
//! - `document_type` - per-template field lists and sections
//! - `generator` - totals, assembly and optional PDF output in one step
//! - `render` - external HTML to PDF conversion

pub mod common;
pub mod document_type;
pub mod engine;
pub mod generator;
pub mod record;
pub mod render;
pub mod section;
pub mod totals;
pub mod traits;
pub mod validation;

pub use document_type::{builtin_document_types, Category, DocumentType, FieldSpec};
pub use engine::{AssemblyOptions, TemplateEngine};
pub use generator::{DocumentGenerator, GenerationRequest, OutputFormat, RequiredFields};
pub use record::{DataRecord, FieldValue, RowRecord};
pub use render::{CommandPdfRenderer, PdfRenderer};
pub use section::{RepeatingSection, RowRenderer, RowTemplate};
pub use totals::Totals;
pub use traits::{Generator, Validator};

use thiserror::Error;

/// Errors that can occur during document generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write HTML source: {0}")]
    WriteHtml(#[source] std::io::Error),
    #[error("PDF renderer could not be started: {0}")]
    RendererIo(#[source] std::io::Error),
    #[error("PDF renderer exited with status {0}")]
    RendererExit(i32),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("no PDF renderer is configured")]
    RendererUnavailable,
}

/// Result of a successful document generation.
#[derive(Debug)]
pub struct GeneratedDocument {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    /// Filled HTML, also kept when the content is a PDF.
    pub html: String,
    pub totals: Option<Totals>,
    pub generated_on: String,
}
