//! Per-field error trees
//!
//! The flat error list is regrouped into an [`ErrorSchema`] mirroring the
//! data: `{"__errors": [...], "name": {"__errors": [...]}}`. Only nodes on
//! the path to at least one error exist.

use serde_json::{Map, Value};

use super::types::{PropertyPath, ValidationError};
use crate::tree::{MirrorLeaf, MirrorTree};

const ERRORS_KEY: &str = "__errors";

/// Messages attached to one node of an error tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl MirrorLeaf for FieldErrors {
    const KEYS: &'static [&'static str] = &[ERRORS_KEY];

    fn write_entries(&self, map: &mut Map<String, Value>) {
        if !self.0.is_empty() {
            map.insert(
                ERRORS_KEY.into(),
                Value::Array(self.0.iter().cloned().map(Value::String).collect()),
            );
        }
    }

    fn read_entries(map: &Map<String, Value>) -> Self {
        let messages = map
            .get(ERRORS_KEY)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        FieldErrors(messages)
    }
}

/// Error messages arranged by data path
pub type ErrorSchema = MirrorTree<FieldErrors>;

/// Groups a flat error list by property path
pub fn to_error_schema(errors: &[ValidationError]) -> ErrorSchema {
    let mut schema = ErrorSchema::default();
    for error in errors {
        schema
            .node_mut(error.property.keys().as_slice())
            .leaf_mut()
            .add_error(error.message.clone());
    }
    schema
}

/// Flattens an error tree back into custom errors, root first
pub fn to_error_list(schema: &ErrorSchema) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    schema.walk(&mut |path, node| {
        for message in node.leaf().messages() {
            errors.push(ValidationError::custom(PropertyPath::from_keys(path), message.clone()));
        }
    });
    errors
}

/// Error accumulator handed to custom validation rules.
///
/// ```ignore
/// |data: &Value, errors: &mut FormValidation| {
///     if data["pass1"] != data["pass2"] {
///         errors.at(&["pass2"]).add_error("Passwords don't match");
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormValidation {
    tree: ErrorSchema,
}

impl FormValidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for the whole form
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.tree.leaf_mut().add_error(message);
    }

    /// Returns the error list for the field at `path`
    pub fn at<S: AsRef<str>>(&mut self, path: &[S]) -> &mut FieldErrors {
        self.tree.node_mut(path).leaf_mut()
    }

    /// Messages recorded at `path`
    pub fn errors_at<S: AsRef<str>>(&self, path: &[S]) -> &[String] {
        self.tree.get(path).map_or(&[][..], |node| node.leaf().messages())
    }

    /// The accumulated errors as custom validation errors
    pub fn into_errors(self) -> Vec<ValidationError> {
        to_error_list(&self.tree)
    }
}
