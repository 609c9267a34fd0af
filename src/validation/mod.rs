//! Validation Adapter for formschema
//!
//! Structural validation of form data, custom rule hooks, and the per-field
//! error tree.
//!
//! # Design Principles
//!
//! - Data problems are values, never failures
//! - Errors keep document order: structural, then custom
//! - The error tree is rebuilt from the final list on every pass
//! - Only an unprocessable schema aborts validation

mod adapter;
mod engine;
mod error_schema;
mod errors;
mod formats;
mod types;

pub use adapter::{validate_form_data, CustomValidate, TransformErrors, ValidateOptions, ValidationReport};
pub use engine::validate_against_schema;
pub use error_schema::{to_error_list, to_error_schema, ErrorSchema, FieldErrors, FormValidation};
pub use errors::{ValidateError, ValidateResult};
pub use formats::FormatRegistry;
pub use types::{ErrorKind, PathSegment, PropertyPath, ValidationError};

use serde_json::Value;

use crate::schema::{Definitions, Schema};

/// Returns whether `data` satisfies `schema` using the built-in formats.
/// A schema that cannot be processed never validates.
pub fn is_valid(schema: &Schema, data: &Value, definitions: &Definitions) -> bool {
    validate_against_schema(schema, definitions, data, &FormatRegistry::new())
        .map_or(false, |errors| errors.is_empty())
}
