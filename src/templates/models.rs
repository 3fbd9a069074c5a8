use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::assembly::engine::placeholder_names;
use crate::assembly::{Category, FieldSpec, OutputFormat, Totals};
use crate::content::FileContent;
use crate::templates::StoredTemplate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateField {
    pub name: String,
    pub label: String,
    pub required: bool,
}

impl From<&FieldSpec> for TemplateField {
    fn from(field: &FieldSpec) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            required: field.required,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub fields: Vec<TemplateField>,
    /// Key of the repeating list field, if the template has one
    pub list_field: Option<String>,
    pub line_item_totals: bool,
}

impl From<&StoredTemplate> for TemplateSummary {
    fn from(template: &StoredTemplate) -> Self {
        let doc_type = &template.doc_type;
        Self {
            id: doc_type.id.clone(),
            name: doc_type.name.clone(),
            category: doc_type.category,
            fields: doc_type.fields.iter().map(TemplateField::from).collect(),
            list_field: doc_type.list_key().map(str::to_string),
            line_item_totals: doc_type.line_item_totals,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub summary: TemplateSummary,
    pub marker: Option<String>,
    pub placeholders: Vec<String>,
    pub content: String,
}

impl From<&StoredTemplate> for TemplateDetail {
    fn from(template: &StoredTemplate) -> Self {
        Self {
            summary: TemplateSummary::from(template),
            marker: template
                .doc_type
                .section
                .as_ref()
                .map(|section| section.marker.clone()),
            placeholders: placeholder_names(&template.content),
            content: template.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderRequest {
    /// Scalar fields plus the list field as an array of row objects
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    /// Remove placeholders that stay unresolved after filling
    pub cleanup: Option<bool>,
    pub missing_value: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Used in the output filename
    pub output_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderResponse {
    pub template_id: String,
    pub filename: String,
    pub generated_on: String,
    /// Filled HTML, present for HTML output
    pub html: Option<String>,
    /// Base64 PDF, present for PDF output
    pub file: Option<FileContent>,
    pub totals: Option<Totals>,
}
