//! Validation utilities built on the `validator` crate.

use crate::{FieldError, StrataError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `StrataError` on failure.
    fn validate_request(&self) -> Result<(), StrataError> {
        self.validate().map_err(|e| validation_errors_to_strata_error(&e))
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator` errors into field errors, sorted by field name.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// Converts `validator::ValidationErrors` to `StrataError`.
#[must_use]
pub fn validation_errors_to_strata_error(errors: &ValidationErrors) -> StrataError {
    let message = field_errors(errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    StrataError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates that a password meets complexity requirements.
    pub fn password_complexity(password: &str) -> Result<(), ValidationError> {
        if password.chars().count() < 8 {
            return Err(ValidationError::new("password_too_short"));
        }
        if !password.chars().any(char::is_alphabetic) {
            return Err(ValidationError::new("password_missing_letter"));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new("password_missing_digit"));
        }
        Ok(())
    }

    /// Validates a snake_case Rust identifier, e.g. a scaffolded app name.
    pub fn snake_case_identifier(name: &str) -> Result<(), ValidationError> {
        let mut chars = name.chars();
        let starts_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !starts_ok || !rest_ok || name.ends_with('_') || name.contains("__") {
            return Err(ValidationError::new("invalid_identifier"));
        }
        Ok(())
    }
}
