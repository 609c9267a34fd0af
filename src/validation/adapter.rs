//! Form validation entry point
//!
//! Runs structural validation, then the caller's custom rules, then the
//! caller's error transform, and finally regroups the surviving errors into
//! an [`ErrorSchema`].

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::engine::validate_against_schema;
use super::error_schema::{to_error_schema, ErrorSchema, FormValidation};
use super::errors::{ValidateError, ValidateResult};
use super::formats::FormatRegistry;
use super::types::{ErrorKind, ValidationError};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::{Definitions, Schema};

/// Caller rules run after structural validation
pub type CustomValidate = Box<dyn Fn(&Value, &mut FormValidation)>;

/// Final adjustment of the flat error list
pub type TransformErrors = Box<dyn Fn(Vec<ValidationError>) -> Vec<ValidationError>>;

/// Optional validation hooks
#[derive(Default)]
pub struct ValidateOptions {
    custom_validate: Option<CustomValidate>,
    transform_errors: Option<TransformErrors>,
    formats: FormatRegistry,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom_validate<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Value, &mut FormValidation) + 'static,
    {
        self.custom_validate = Some(Box::new(rule));
        self
    }

    pub fn with_transform_errors<F>(mut self, transform: F) -> Self
    where
        F: Fn(Vec<ValidationError>) -> Vec<ValidationError> + 'static,
    {
        self.transform_errors = Some(Box::new(transform));
        self
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }
}

impl fmt::Debug for ValidateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateOptions")
            .field("custom_validate", &self.custom_validate.is_some())
            .field("transform_errors", &self.transform_errors.is_some())
            .field("formats", &self.formats)
            .finish()
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub error_schema: ErrorSchema,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages reported for the field at `path`
    pub fn errors_at<S: AsRef<str>>(&self, path: &[S]) -> Vec<&str> {
        self.error_schema
            .get(path)
            .map(|node| node.leaf().messages().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Validates form data against its root schema.
///
/// `$ref`s resolve against `schema` itself.
///
/// # Errors
///
/// Only for schemas that cannot be processed: cyclic references,
/// invalid `pattern` expressions or an unserialisable schema.
pub fn validate_form_data(form_data: &Value, schema: &Schema, options: &ValidateOptions) -> ValidateResult<ValidationReport> {
    let definitions = Definitions::from_root(schema)?;
    let report = run(form_data, schema, &definitions, options);
    match &report {
        Ok(report) => {
            let errors = report.errors.len().to_string();
            let custom = report
                .errors
                .iter()
                .filter(|e| e.kind == ErrorKind::Custom)
                .count()
                .to_string();
            log_event_with_fields(
                Event::ValidationComplete,
                &[("errors", errors.as_str()), ("custom_errors", custom.as_str())],
            );
        }
        Err(e) => Logger::error(Event::ValidationFailed.as_str(), &[("reason", e.to_string().as_str())]),
    }
    report
}

fn run(
    form_data: &Value,
    schema: &Schema,
    definitions: &Definitions,
    options: &ValidateOptions,
) -> ValidateResult<ValidationReport> {
    let mut errors = validate_against_schema(schema, definitions, form_data, &options.formats)
        .map_err(ValidateError::from)?;

    if let Some(rule) = &options.custom_validate {
        let mut validation = FormValidation::new();
        rule(form_data, &mut validation);
        errors.extend(validation.into_errors());
    }

    if let Some(transform) = &options.transform_errors {
        errors = transform(errors);
    }

    let error_schema = to_error_schema(&errors);
    Ok(ValidationReport { errors, error_schema })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> Schema {
        Schema::from_value(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "default": "x"},
                "pass1": {"type": "string", "minLength": 3},
                "pass2": {"type": "string", "minLength": 3}
            },
            "required": ["name"]
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_required_property() {
        let report = validate_form_data(&json!({}), &person(), &ValidateOptions::new()).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "required");
        assert_eq!(report.errors_at(&["name"]), vec!["is a required property"]);
    }

    #[test]
    fn test_custom_validate_errors_are_merged() {
        let options = ValidateOptions::new().with_custom_validate(|data, errors| {
            if data["pass1"] != data["pass2"] {
                errors.at(&["pass2"]).add_error("Passwords don't match");
            }
        });
        let report = validate_form_data(
            &json!({"name": "n", "pass1": "abc", "pass2": "ab"}),
            &person(),
            &options,
        )
        .unwrap();
        assert_eq!(
            report.errors_at(&["pass2"]),
            vec!["should NOT be shorter than 3 characters", "Passwords don't match"]
        );
        assert_eq!(report.errors[1].kind, ErrorKind::Custom);
    }

    #[test]
    fn test_transform_errors_filters_list_and_tree() {
        let options = ValidateOptions::new()
            .with_transform_errors(|errors| errors.into_iter().filter(|e| e.name != "required").collect());
        let report = validate_form_data(&json!({"pass1": "a"}), &person(), &options).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(report.error_schema.child("name").is_none());
        assert!(report.error_schema.child("pass1").is_some());
    }

    #[test]
    fn test_transform_sees_custom_errors() {
        let options = ValidateOptions::new()
            .with_custom_validate(|_, errors| errors.add_error("always"))
            .with_transform_errors(|errors| {
                errors
                    .into_iter()
                    .map(|mut e| {
                        e.message = e.message.to_uppercase();
                        e
                    })
                    .collect()
            });
        let report = validate_form_data(&json!({"name": "n"}), &person(), &options).unwrap();
        assert_eq!(report.error_schema.leaf().messages(), &["ALWAYS".to_string()]);
    }

    #[test]
    fn test_custom_formats() {
        let schema = Schema::from_value(json!({"type": "string", "format": "zip-code"})).unwrap();
        let formats = FormatRegistry::new().with_format("zip-code", r"^\d{5}$").unwrap();
        let options = ValidateOptions::new().with_formats(formats);
        assert!(validate_form_data(&json!("12345"), &schema, &options).unwrap().is_valid());
        assert!(!validate_form_data(&json!("1234"), &schema, &options).unwrap().is_valid());
        // unknown formats pass
        assert!(validate_form_data(&json!("1234"), &schema, &ValidateOptions::new()).unwrap().is_valid());
    }

    #[test]
    fn test_report_serialises_camel_case() {
        let report = validate_form_data(&json!({}), &person(), &ValidateOptions::new()).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["errorSchema"]["name"]["__errors"][0], "is a required property");
        assert_eq!(value["errors"][0]["stack"], ".name is a required property");
    }
}
