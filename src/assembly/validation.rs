//! Input validation for document generation requests.
//!
//! Errors are collected rather than returned one by one so a form can show
//! every problem at once.

use std::fmt;

use super::record::DataRecord;

/// Validation error with a user-facing message.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    pub message: String,
    /// Suggestion for how to fix the error
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create error for empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} must not be empty", label))
            .with_suggestion(format!("Please provide a value for {}", label.to_lowercase()))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Numbered, multi-line message suitable for an API error body.
    pub fn to_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!(
            "Validation failed: {} error(s) found",
            self.errors.len()
        )];

        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }

        parts.join("\n")
    }

    /// Ok if no errors, Err with the formatted message otherwise.
    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_message())
        }
    }
}

/// Validate that a scalar field is present and not blank.
pub fn validate_required(data: &DataRecord, field: &str, label: &str, errors: &mut ValidationErrors) {
    let blank = match data.get(field) {
        None => true,
        Some(value) => value.is_missing() || value.to_string().trim().is_empty(),
    };
    if blank {
        errors.add(ValidationError::empty_field(field, label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::record::FieldValue;

    #[test]
    fn test_validate_required_empty() {
        let data = DataRecord::new().with_scalar("name", "   ");
        let mut errors = ValidationErrors::new();
        validate_required(&data, "name", "Full name", &mut errors);
        validate_required(&data, "missing", "Other", &mut errors);
        assert_eq!(errors.len(), 2);
        assert!(errors.to_message().contains("Full name must not be empty"));
    }

    #[test]
    fn test_validate_required_valid() {
        let data = DataRecord::new()
            .with_scalar("name", "John Doe")
            .with_scalar("amount", FieldValue::Number(0.0));
        let mut errors = ValidationErrors::new();
        validate_required(&data, "name", "Full name", &mut errors);
        validate_required(&data, "amount", "Amount", &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_validation_errors_message() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::empty_field("buyer_name", "Buyer"));
        errors.add(
            ValidationError::new("amount", "Amount must be positive")
                .with_suggestion("Enter a value greater than zero"),
        );

        let msg = errors.into_result().unwrap_err();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("1. [buyer_name] Buyer must not be empty"));
        assert!(msg.contains("2. [amount] Amount must be positive. Enter a value greater than zero"));
    }
}
