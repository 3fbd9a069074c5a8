//! Document types: which fields a template expects and how its line items
//! are expanded.
//!
//! One [`DocumentType`] per template replaces per-screen substitution code;
//! the engine itself stays generic.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::engine::is_field_name;
use super::section::RepeatingSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Commercial,
    Financial,
    Hr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub required: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum DefinitionError {
    #[error("document type id must not be empty")]
    EmptyId,
    #[error("invalid field name '{0}' (letters, digits and underscores only)")]
    InvalidFieldName(String),
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
    #[error("list field '{0}' collides with a scalar field")]
    ListKeyCollision(String),
    #[error("repeating section for '{0}' has an empty marker")]
    EmptyMarker(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentType {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub template_file: String,
    pub fields: Vec<FieldSpec>,
    pub section: Option<RepeatingSection>,
    /// Compute line-item totals before assembly.
    pub line_item_totals: bool,
}

impl DocumentType {
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
    ) -> DocumentTypeBuilder {
        let id = id.into();
        DocumentTypeBuilder {
            template_file: format!("{}.html", id.replace('-', "_")),
            id,
            name: name.into(),
            category,
            fields: Vec::new(),
            section: None,
            line_item_totals: false,
        }
    }

    pub fn list_key(&self) -> Option<&str> {
        self.section.as_ref().map(|section| section.list_key.as_str())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.required)
    }
}

pub struct DocumentTypeBuilder {
    id: String,
    name: String,
    category: Category,
    template_file: String,
    fields: Vec<FieldSpec>,
    section: Option<RepeatingSection>,
    line_item_totals: bool,
}

impl DocumentTypeBuilder {
    pub fn field(self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.push_field(name, label, true)
    }

    pub fn optional_field(self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.push_field(name, label, false)
    }

    fn push_field(mut self, name: impl Into<String>, label: impl Into<String>, required: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            label: label.into(),
            required,
        });
        self
    }

    pub fn repeating_section(mut self, section: RepeatingSection) -> Self {
        self.section = Some(section);
        self
    }

    pub fn with_line_item_totals(mut self) -> Self {
        self.line_item_totals = true;
        self
    }

    pub fn build(self) -> Result<DocumentType, DefinitionError> {
        if self.id.trim().is_empty() {
            return Err(DefinitionError::EmptyId);
        }

        for (index, field) in self.fields.iter().enumerate() {
            if !is_field_name(&field.name) {
                return Err(DefinitionError::InvalidFieldName(field.name.clone()));
            }
            if self.fields[..index].iter().any(|other| other.name == field.name) {
                return Err(DefinitionError::DuplicateField(field.name.clone()));
            }
        }

        if let Some(section) = &self.section {
            if !is_field_name(&section.list_key) {
                return Err(DefinitionError::InvalidFieldName(section.list_key.clone()));
            }
            if self.fields.iter().any(|field| field.name == section.list_key) {
                return Err(DefinitionError::ListKeyCollision(section.list_key.clone()));
            }
            if section.marker.is_empty() {
                return Err(DefinitionError::EmptyMarker(section.list_key.clone()));
            }
        }

        Ok(DocumentType {
            id: self.id,
            name: self.name,
            category: self.category,
            template_file: self.template_file,
            fields: self.fields,
            section: self.section,
            line_item_totals: self.line_item_totals,
        })
    }
}

pub const INVOICE_ROWS_MARKER: &str = "<tr class=\"line-items\"></tr>";
pub const DUTIES_MARKER: &str = "<li class=\"duties\"></li>";

fn invoice() -> Result<DocumentType, DefinitionError> {
    DocumentType::builder("invoice", "VAT invoice", Category::Commercial)
        .field("invoice_number", "Invoice number")
        .field("issue_date", "Issue date")
        .field("sale_date", "Sale date")
        .field("seller_name", "Seller")
        .field("seller_address", "Seller address")
        .field("seller_tax_id", "Seller tax ID")
        .field("buyer_name", "Buyer")
        .field("buyer_address", "Buyer address")
        .optional_field("buyer_tax_id", "Buyer tax ID")
        .field("payment_method", "Payment method")
        .field("payment_due", "Payment due date")
        .optional_field("bank_account", "Bank account")
        .optional_field("notes", "Notes")
        .repeating_section(RepeatingSection::new(
            "products",
            INVOICE_ROWS_MARKER,
            "<tr><td>{{position}}</td><td>{{name}}</td><td>{{quantity}}</td><td>{{unit}}</td>\
             <td>{{unitPrice}}</td><td>{{taxRatePercent}}%</td><td>{{netValue}}</td>\
             <td>{{taxValue}}</td><td>{{grossValue}}</td></tr>",
            "<tr><td colspan=\"9\">No items</td></tr>",
        ))
        .with_line_item_totals()
        .build()
}

fn payment_demand() -> Result<DocumentType, DefinitionError> {
    DocumentType::builder("payment-demand", "Payment demand", Category::Financial)
        .field("demand_date", "Demand date")
        .field("creditor_name", "Creditor")
        .field("creditor_address", "Creditor address")
        .field("debtor_name", "Debtor")
        .field("debtor_address", "Debtor address")
        .field("invoice_reference", "Invoice reference")
        .field("amount", "Amount due")
        .field("due_date", "Payment deadline")
        .optional_field("bank_account", "Bank account")
        .build()
}

fn duties_scope() -> Result<DocumentType, DefinitionError> {
    DocumentType::builder("duties-scope", "Scope of duties", Category::Hr)
        .field("employer_name", "Employer")
        .field("employee_name", "Employee")
        .field("position_title", "Position")
        .optional_field("department", "Department")
        .field("effective_date", "Effective date")
        .repeating_section(RepeatingSection::new(
            "duties",
            DUTIES_MARKER,
            "<li>{{duty}}</li>",
            "<li>-</li>",
        ))
        .build()
}

/// Document types bundled with the service.
pub fn builtin_document_types() -> Result<Vec<DocumentType>, DefinitionError> {
    Ok(vec![invoice()?, payment_demand()?, duties_scope()?])
}
