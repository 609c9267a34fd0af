//! Validation adapter errors
//!
//! Only schemas that cannot be processed at all surface here. Data
//! problems are values in the returned report.

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for validation operations
pub type ValidateResult<T> = Result<T, ValidateError>;

/// Hard validation failures
#[derive(Debug, Clone, Error)]
pub enum ValidateError {
    /// The schema is structurally invalid (cyclic reference, bad pattern, ...)
    #[error("Schema cannot be validated: {0}")]
    Schema(#[from] SchemaError),

    /// A custom format pattern does not compile
    #[error("Invalid pattern for format '{name}': {reason}")]
    InvalidFormat { name: String, reason: String },
}

impl ValidateError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ValidateError::Schema(e) => e.code().code(),
            ValidateError::InvalidFormat { .. } => "FORM_VALIDATE_INVALID_FORMAT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = ValidateError::from(SchemaError::cyclic_reference("#/definitions/a"));
        assert_eq!(err.code(), "FORM_SCHEMA_CYCLIC_REF");
        assert!(err.to_string().contains("#/definitions/a"));

        let err = ValidateError::InvalidFormat {
            name: "zip".into(),
            reason: "unclosed group".into(),
        };
        assert_eq!(err.code(), "FORM_VALIDATE_INVALID_FORMAT");
    }
}
