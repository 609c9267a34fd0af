//! Form state errors

use thiserror::Error;

use crate::schema::SchemaError;
use crate::validation::ValidateError;

/// Errors raised while building or changing a form state
#[derive(Debug, Clone, Error)]
pub enum FormError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error("Cannot set value at '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl FormError {
    pub(crate) fn invalid_path(path: &[String], reason: impl Into<String>) -> Self {
        FormError::InvalidPath {
            path: path.join("."),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FormError::Schema(e) => e.code().code(),
            FormError::Validate(e) => e.code(),
            FormError::InvalidPath { .. } => "FORM_STATE_INVALID_PATH",
        }
    }
}

/// Result type for form state operations
pub type FormResult<T> = Result<T, FormError>;
