//! Schema error types
//!
//! Error codes:
//! - FORM_SCHEMA_MALFORMED (FATAL)
//! - FORM_SCHEMA_UNRESOLVABLE_REF (RECOVERABLE)
//! - FORM_SCHEMA_UNSUPPORTED_REF (RECOVERABLE)
//! - FORM_SCHEMA_CYCLIC_REF (FATAL)
//! - FORM_SCHEMA_DEPTH_EXCEEDED (FATAL)
//! - FORM_SCHEMA_NOT_CONSTANT (RECOVERABLE)
//! - FORM_SCHEMA_INVALID_ORDER (RECOVERABLE)
//!
//! Recoverable errors are reported to callers as part of a validation error
//! list. Fatal errors mean the schema itself cannot be processed.

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Reported as a value, processing continues
    Recoverable,
    /// The schema is structurally invalid
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Recoverable => write!(f, "RECOVERABLE"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema JSON does not describe a schema
    FormSchemaMalformed,
    /// `$ref` target does not exist
    FormSchemaUnresolvableRef,
    /// `$ref` is not a local JSON pointer
    FormSchemaUnsupportedRef,
    /// `$ref` chain revisits a reference
    FormSchemaCyclicRef,
    /// Recursion exceeded the configured maximum depth
    FormSchemaDepthExceeded,
    /// `minItems` asks for more elements than may be synthesised
    FormSchemaItemLimitExceeded,
    /// Schema was expected to describe a single constant value
    FormSchemaNotConstant,
    /// `ui:order` cannot be applied to the declared properties
    FormSchemaInvalidOrder,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::FormSchemaMalformed => "FORM_SCHEMA_MALFORMED",
            SchemaErrorCode::FormSchemaUnresolvableRef => "FORM_SCHEMA_UNRESOLVABLE_REF",
            SchemaErrorCode::FormSchemaUnsupportedRef => "FORM_SCHEMA_UNSUPPORTED_REF",
            SchemaErrorCode::FormSchemaCyclicRef => "FORM_SCHEMA_CYCLIC_REF",
            SchemaErrorCode::FormSchemaDepthExceeded => "FORM_SCHEMA_DEPTH_EXCEEDED",
            SchemaErrorCode::FormSchemaItemLimitExceeded => "FORM_SCHEMA_ITEM_LIMIT_EXCEEDED",
            SchemaErrorCode::FormSchemaNotConstant => "FORM_SCHEMA_NOT_CONSTANT",
            SchemaErrorCode::FormSchemaInvalidOrder => "FORM_SCHEMA_INVALID_ORDER",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::FormSchemaUnresolvableRef
            | SchemaErrorCode::FormSchemaUnsupportedRef
            | SchemaErrorCode::FormSchemaNotConstant
            | SchemaErrorCode::FormSchemaInvalidOrder => Severity::Recoverable,
            SchemaErrorCode::FormSchemaMalformed
            | SchemaErrorCode::FormSchemaCyclicRef
            | SchemaErrorCode::FormSchemaDepthExceeded
            | SchemaErrorCode::FormSchemaItemLimitExceeded => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    reference: Option<String>,
}

impl SchemaError {
    /// Create a malformed schema error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::FormSchemaMalformed,
            message: format!("Malformed schema: {}", reason.into()),
            reference: None,
        }
    }

    /// Create an unresolvable reference error
    pub fn unresolvable_reference(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            code: SchemaErrorCode::FormSchemaUnresolvableRef,
            message: format!("Could not find a definition for {}", reference),
            reference: Some(reference),
        }
    }

    /// Create an unsupported reference error
    pub fn unsupported_reference(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            code: SchemaErrorCode::FormSchemaUnsupportedRef,
            message: format!("Only local references are supported, got {}", reference),
            reference: Some(reference),
        }
    }

    /// Create a cyclic reference error
    pub fn cyclic_reference(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            code: SchemaErrorCode::FormSchemaCyclicRef,
            message: format!("Reference {} resolves to itself", reference),
            reference: Some(reference),
        }
    }

    /// Create a depth exceeded error
    pub fn depth_exceeded(max_depth: usize) -> Self {
        Self {
            code: SchemaErrorCode::FormSchemaDepthExceeded,
            message: format!("Schema nesting exceeds maximum depth of {}", max_depth),
            reference: None,
        }
    }

    /// Create an item limit error
    pub fn item_limit_exceeded(min_items: usize, limit: usize) -> Self {
        Self {
            code: SchemaErrorCode::FormSchemaItemLimitExceeded,
            message: format!("minItems {} exceeds the padding limit of {}", min_items, limit),
            reference: None,
        }
    }

    /// Create a not-constant error
    pub fn not_constant() -> Self {
        Self {
            code: SchemaErrorCode::FormSchemaNotConstant,
            message: "schema cannot be inferred as a constant".into(),
            reference: None,
        }
    }

    /// Create an invalid property order error
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::FormSchemaInvalidOrder,
            message: format!("uiSchema order list {}", reason.into()),
            reference: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending reference if applicable
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Returns whether this error aborts processing
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(e.to_string())
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
