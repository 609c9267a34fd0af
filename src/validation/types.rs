//! Validation error values
//!
//! Every problem found while validating form data becomes a
//! [`ValidationError`] in the returned list. Nothing here aborts.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Where an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// A `$ref` could not be resolved while validating
    #[serde(rename = "SchemaResolutionError")]
    SchemaResolution,
    /// A keyword rejected the data
    #[serde(rename = "ValidationError")]
    Structural,
    /// Added by caller-supplied rules
    #[serde(rename = "CustomValidationError")]
    Custom,
}

/// One step of a property path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// The segment as an error-tree key
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }
}

/// Path from the form root to the offending value.
///
/// Rendered as `.name`, `.list[0]` or `['first name']`; the root renders as
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PropertyPath(Vec<PathSegment>);

impl PropertyPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from error-tree keys; all-digit keys become indices
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Self {
        Self(
            keys.iter()
                .map(|key| {
                    let key = key.as_ref();
                    match key.parse::<usize>() {
                        Ok(index) if key.chars().all(|c| c.is_ascii_digit()) => PathSegment::Index(index),
                        _ => PathSegment::Key(key.to_string()),
                    }
                })
                .collect(),
        )
    }

    /// Returns a child path for an object property
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Returns a child path for an array element
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path as error-tree keys
    pub fn keys(&self) -> Vec<String> {
        self.0.iter().map(PathSegment::as_key).collect()
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) if is_identifier(key) => write!(f, ".{}", key)?,
                PathSegment::Key(key) => {
                    write!(f, "['{}']", key.replace('\\', "\\\\").replace('\'', "\\'"))?
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl Serialize for PropertyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// Keyword that failed (`required`, `type`, `$ref`, ...)
    pub name: String,
    pub property: PropertyPath,
    pub message: String,
    /// Keyword parameters, e.g. `{"missingProperty": "name"}`
    pub params: Value,
    /// Property and message combined for display
    pub stack: String,
}

impl ValidationError {
    pub fn new(
        kind: ErrorKind,
        name: impl Into<String>,
        property: PropertyPath,
        message: impl Into<String>,
        params: Value,
    ) -> Self {
        let message = message.into();
        let stack = format!("{} {}", property, message).trim().to_string();
        Self {
            kind,
            name: name.into(),
            property,
            message,
            params,
            stack,
        }
    }

    /// A keyword violation
    pub fn structural(name: &str, property: PropertyPath, message: impl Into<String>, params: Value) -> Self {
        Self::new(ErrorKind::Structural, name, property, message, params)
    }

    /// An error added by custom rules
    pub fn custom(property: PropertyPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Custom, "custom", property, message, Value::Object(Default::default()))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_path_rendering() {
        let path = PropertyPath::root().key("list").index(0).key("first name");
        assert_eq!(path.to_string(), ".list[0]['first name']");
        assert_eq!(PropertyPath::root().to_string(), "");
        assert_eq!(PropertyPath::root().key("it's").to_string(), r"['it\'s']");
    }

    #[test]
    fn test_keys_round_trip_through_tree_form() {
        let path = PropertyPath::from_keys(&["list", "3", "name"]);
        assert_eq!(path.to_string(), ".list[3].name");
        assert_eq!(path.keys(), vec!["list", "3", "name"]);
    }

    #[test]
    fn test_stack_combines_property_and_message() {
        let err = ValidationError::structural(
            "required",
            PropertyPath::root().key("name"),
            "is a required property",
            json!({"missingProperty": "name"}),
        );
        assert_eq!(err.stack, ".name is a required property");

        let root = ValidationError::custom(PropertyPath::root(), "form is incomplete");
        assert_eq!(root.stack, "form is incomplete");
    }

    #[test]
    fn test_serialised_form() {
        let err = ValidationError::structural("type", PropertyPath::root().key("age"), "should be number", json!({"type": "number"}));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "ValidationError");
        assert_eq!(value["property"], ".age");
    }
}
