//! Generic document generator driven by a [`DocumentType`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{sanitize_filename, today_formatted};
use super::document_type::DocumentType;
use super::engine::{AssemblyOptions, TemplateEngine};
use super::record::{DataRecord, FieldValue};
use super::render::PdfRenderer;
use super::totals::compute_totals;
use super::traits::{Generator, Validator};
use super::validation::{validate_required, ValidationErrors};
use super::{GeneratedDocument, GeneratorError};

pub const POSITION_FIELD: &str = "position";
pub const GENERATED_ON_FIELD: &str = "generated_on";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Pdf,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub data: DataRecord,
    pub options: AssemblyOptions,
    pub format: OutputFormat,
    /// Used to build the output filename; falls back to the type id.
    pub output_name: Option<String>,
}

impl GenerationRequest {
    pub fn new(data: DataRecord) -> Self {
        Self {
            data,
            options: AssemblyOptions::default(),
            format: OutputFormat::Html,
            output_name: None,
        }
    }

    pub fn with_options(mut self, options: AssemblyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// Required-field check of a record against its document type.
pub struct RequiredFields<'a> {
    pub doc_type: &'a DocumentType,
    pub data: &'a DataRecord,
}

impl Validator for RequiredFields<'_> {
    fn validation_errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in self.doc_type.required_fields() {
            validate_required(self.data, &field.name, &field.label, &mut errors);
        }
        errors
    }
}

pub struct DocumentGenerator<'a> {
    doc_type: &'a DocumentType,
    template: &'a str,
    renderer: Option<&'a dyn PdfRenderer>,
}

impl<'a> DocumentGenerator<'a> {
    pub fn new(doc_type: &'a DocumentType, template: &'a str) -> Self {
        Self {
            doc_type,
            template,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Option<&'a dyn PdfRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Apply derived fields: line totals, row positions and the generation date.
    fn prepare(&self, data: &mut DataRecord) -> Option<super::totals::Totals> {
        let totals = match self.doc_type.list_key() {
            Some(key) if self.doc_type.line_item_totals => {
                let totals = compute_totals(data.rows(key));
                totals.apply_to(data);
                Some(totals)
            }
            _ => None,
        };

        if let Some(rows) = data.rows_mut() {
            for (index, row) in rows.iter_mut().enumerate() {
                row.entry(POSITION_FIELD.to_string())
                    .or_insert(FieldValue::Number((index + 1) as f64));
            }
        }

        if !data.contains(GENERATED_ON_FIELD) {
            data.insert(GENERATED_ON_FIELD, today_formatted());
        }

        totals
    }

    fn filename(&self, output_name: Option<&str>, extension: &str) -> String {
        let type_part = sanitize_filename(&self.doc_type.id, "document");
        match output_name.map(|name| sanitize_filename(name, "")) {
            Some(name) if !name.is_empty() => format!("{}-{}.{}", type_part, name, extension),
            _ => format!("{}.{}", type_part, extension),
        }
    }
}

impl Generator<GenerationRequest> for DocumentGenerator<'_> {
    fn generate(&self, request: GenerationRequest) -> Result<GeneratedDocument, GeneratorError> {
        let GenerationRequest {
            mut data,
            options,
            format,
            output_name,
        } = request;

        if let Some(key) = self.doc_type.list_key() {
            if data.list_key().is_none() {
                data.set_list(key, Vec::new());
            }
        }

        let totals = self.prepare(&mut data);
        let generated_on = data
            .get(GENERATED_ON_FIELD)
            .map(ToString::to_string)
            .unwrap_or_default();

        let html = TemplateEngine::new(options).assemble(
            self.template,
            &data,
            self.doc_type.section.as_ref(),
        );

        let (content, mime_type, extension) = match format {
            OutputFormat::Html => (html.clone().into_bytes(), "text/html", "html"),
            OutputFormat::Pdf => {
                let renderer = self.renderer.ok_or(GeneratorError::RendererUnavailable)?;
                (renderer.render_pdf(&html)?, "application/pdf", "pdf")
            }
        };

        log::info!(
            "Generated '{}' document ({} bytes, {:?})",
            self.doc_type.id,
            content.len(),
            format
        );

        Ok(GeneratedDocument {
            filename: self.filename(output_name.as_deref(), extension),
            mime_type: mime_type.to_string(),
            content,
            html,
            totals,
            generated_on,
        })
    }
}
