//! Seams between requests, validation and generation.

use super::validation::ValidationErrors;
use super::{GeneratedDocument, GeneratorError};

/// Implemented by anything that can be checked before generation.
pub trait Validator {
    /// Every problem found; empty when the value is valid.
    fn validation_errors(&self) -> ValidationErrors;

    /// `Err` carries the formatted message of all errors.
    fn validate(&self) -> Result<(), String> {
        self.validation_errors().into_result()
    }
}

/// A document generator for one request type.
pub trait Generator<Req> {
    fn generate(&self, request: Req) -> Result<GeneratedDocument, GeneratorError>;
}
