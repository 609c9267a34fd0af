//! Structural validation engine
//!
//! Validates a data value against a schema and collects every violation in
//! document order. Messages and keyword parameters follow the conventions
//! form renderers already display (`is a required property`,
//! `should be string`, ...).
//!
//! Unresolvable references are reported as `$ref` errors and validation
//! continues. A reference chain that revisits a reference without
//! descending into the data is a hard failure.

use std::collections::{HashMap, HashSet};

use fancy_regex::Regex;
use serde_json::{json, Map, Value};

use super::formats::FormatRegistry;
use super::types::{ErrorKind, PropertyPath, ValidationError};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::utils::deep_equals;
use crate::schema::{overlay, Definitions, Dependency, Items, Schema, SchemaError, SchemaOrBool, SchemaResult};

const MULTIPLE_OF_TOLERANCE: f64 = 1e-9;

/// Validates `data` against `schema` and returns the violations found.
///
/// # Errors
///
/// - A cyclic reference chain
/// - A `pattern` that is not a valid regular expression. Patterns are
///   ECMA-262 style, so lookaround and backreferences are accepted
pub fn validate_against_schema(
    schema: &Schema,
    definitions: &Definitions,
    data: &Value,
    formats: &FormatRegistry,
) -> SchemaResult<Vec<ValidationError>> {
    let mut engine = Engine::new(definitions, formats);
    engine.visit(schema, data, &PropertyPath::root(), &mut Vec::new())?;
    Ok(engine.errors)
}

struct Engine<'a> {
    definitions: &'a Definitions,
    formats: &'a FormatRegistry,
    errors: Vec<ValidationError>,
    patterns: HashMap<String, Regex>,
    unknown_formats: HashSet<String>,
}

impl<'a> Engine<'a> {
    fn new(definitions: &'a Definitions, formats: &'a FormatRegistry) -> Self {
        Self {
            definitions,
            formats,
            errors: Vec::new(),
            patterns: HashMap::new(),
            unknown_formats: HashSet::new(),
        }
    }

    fn report(&mut self, name: &str, path: &PropertyPath, message: String, params: Value) {
        self.errors
            .push(ValidationError::structural(name, path.clone(), message, params));
    }

    /// Validates without keeping the errors; returns whether none occurred
    fn passes(&mut self, schema: &Schema, data: &Value, path: &PropertyPath, chain: &mut Vec<String>) -> SchemaResult<bool> {
        let mark = self.errors.len();
        self.visit(schema, data, path, chain)?;
        let valid = self.errors.len() == mark;
        self.errors.truncate(mark);
        Ok(valid)
    }

    fn visit(&mut self, schema: &Schema, data: &Value, path: &PropertyPath, chain: &mut Vec<String>) -> SchemaResult<()> {
        if let Some(reference) = &schema.reference {
            return self.visit_reference(schema, reference, data, path, chain);
        }

        if let Some(types) = &schema.schema_type {
            if !types.accepts(data) {
                let names = types.names();
                self.report("type", path, format!("should be {}", names), json!({ "type": names }));
            }
        }
        if let Some(allowed) = &schema.enum_values {
            if !allowed.iter().any(|v| deep_equals(v, data)) {
                self.report(
                    "enum",
                    path,
                    "should be equal to one of the allowed values".into(),
                    json!({ "allowedValues": allowed }),
                );
            }
        }
        if let Some(constant) = &schema.constant {
            if !deep_equals(constant, data) {
                self.report(
                    "const",
                    path,
                    "should be equal to constant".into(),
                    json!({ "allowedValue": constant }),
                );
            }
        }

        match data {
            Value::String(s) => self.visit_string(schema, s, path)?,
            Value::Number(_) => self.visit_number(schema, data, path),
            Value::Array(items) => self.visit_array(schema, items, path)?,
            Value::Object(map) => self.visit_object(schema, map, data, path, chain)?,
            _ => {}
        }

        self.visit_combinators(schema, data, path, chain)
    }

    fn visit_reference(
        &mut self,
        schema: &Schema,
        reference: &str,
        data: &Value,
        path: &PropertyPath,
        chain: &mut Vec<String>,
    ) -> SchemaResult<()> {
        if chain.iter().any(|r| r == reference) {
            return Err(SchemaError::cyclic_reference(reference));
        }
        let target = match self.definitions.find(reference) {
            Ok(target) => target,
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                self.errors.push(ValidationError::new(
                    ErrorKind::SchemaResolution,
                    "$ref",
                    path.clone(),
                    format!("can't resolve reference {} from id #", reference),
                    json!({ "ref": reference }),
                ));
                return Ok(());
            }
        };

        let mut local = schema.clone();
        local.reference = None;
        let effective = overlay(&target, &local)?;

        chain.push(reference.to_string());
        let outcome = self.visit(&effective, data, path, chain);
        chain.pop();
        outcome
    }

    fn visit_string(&mut self, schema: &Schema, s: &str, path: &PropertyPath) -> SchemaResult<()> {
        let length = s.chars().count() as u64;
        if let Some(min) = schema.min_length {
            if length < min {
                self.report(
                    "minLength",
                    path,
                    format!("should NOT be shorter than {} characters", min),
                    json!({ "limit": min }),
                );
            }
        }
        if let Some(max) = schema.max_length {
            if length > max {
                self.report(
                    "maxLength",
                    path,
                    format!("should NOT be longer than {} characters", max),
                    json!({ "limit": max }),
                );
            }
        }
        if let Some(pattern) = &schema.pattern {
            // a match that exhausts the backtracking budget counts as a mismatch
            if !self.pattern(pattern)?.is_match(s).unwrap_or(false) {
                self.report(
                    "pattern",
                    path,
                    format!("should match pattern \"{}\"", pattern),
                    json!({ "pattern": pattern }),
                );
            }
        }
        if let Some(format) = &schema.format {
            match self.formats.check(format, s) {
                Some(true) => {}
                Some(false) => self.report(
                    "format",
                    path,
                    format!("should match format \"{}\"", format),
                    json!({ "format": format }),
                ),
                None => {
                    if self.unknown_formats.insert(format.clone()) {
                        log_event_with_fields(Event::UnknownFormat, &[("format", format.as_str())]);
                    }
                }
            }
        }
        Ok(())
    }

    fn pattern(&mut self, pattern: &str) -> SchemaResult<&Regex> {
        if !self.patterns.contains_key(pattern) {
            let regex = Regex::new(pattern)
                .map_err(|e| SchemaError::malformed(format!("invalid pattern {}: {}", pattern, e)))?;
            self.patterns.insert(pattern.to_string(), regex);
        }
        self.patterns
            .get(pattern)
            .ok_or_else(|| SchemaError::malformed(format!("invalid pattern {}", pattern)))
    }

    fn visit_number(&mut self, schema: &Schema, data: &Value, path: &PropertyPath) {
        let Some(n) = data.as_f64() else {
            return;
        };
        let bounds = [
            (schema.minimum, "minimum", ">=", false),
            (schema.maximum, "maximum", "<=", false),
            (schema.exclusive_minimum, "exclusiveMinimum", ">", true),
            (schema.exclusive_maximum, "exclusiveMaximum", "<", true),
        ];
        for (limit, keyword, comparison, exclusive) in bounds {
            let Some(limit) = limit else {
                continue;
            };
            let holds = match comparison {
                ">=" => n >= limit,
                "<=" => n <= limit,
                ">" => n > limit,
                _ => n < limit,
            };
            if !holds {
                let limit = number(limit);
                self.report(
                    keyword,
                    path,
                    format!("should be {} {}", comparison, limit),
                    json!({ "comparison": comparison, "limit": limit, "exclusive": exclusive }),
                );
            }
        }
        if let Some(divisor) = schema.multiple_of.filter(|d| *d > 0.0) {
            let quotient = n / divisor;
            if (quotient - quotient.round()).abs() > MULTIPLE_OF_TOLERANCE {
                let divisor = number(divisor);
                self.report(
                    "multipleOf",
                    path,
                    format!("should be multiple of {}", divisor),
                    json!({ "multipleOf": divisor }),
                );
            }
        }
    }

    fn visit_array(&mut self, schema: &Schema, items: &[Value], path: &PropertyPath) -> SchemaResult<()> {
        let count = items.len() as u64;
        if let Some(min) = schema.min_items.filter(|min| count < *min) {
            self.report(
                "minItems",
                path,
                format!("should NOT have fewer than {} items", min),
                json!({ "limit": min }),
            );
        }
        if let Some(max) = schema.max_items.filter(|max| count > *max) {
            self.report(
                "maxItems",
                path,
                format!("should NOT have more than {} items", max),
                json!({ "limit": max }),
            );
        }
        if schema.unique_items == Some(true) {
            if let Some((i, j)) = first_duplicate(items) {
                self.report(
                    "uniqueItems",
                    path,
                    format!("should NOT have duplicate items (items ## {} and {} are identical)", j, i),
                    json!({ "i": i, "j": j }),
                );
            }
        }

        match &schema.items {
            Some(Items::Single(item)) => {
                for (index, element) in items.iter().enumerate() {
                    self.visit(item, element, &path.index(index), &mut Vec::new())?;
                }
            }
            Some(Items::Tuple(positions)) => {
                for (index, (position, element)) in positions.iter().zip(items).enumerate() {
                    self.visit(position, element, &path.index(index), &mut Vec::new())?;
                }
                let rest = items.iter().enumerate().skip(positions.len());
                match &schema.additional_items {
                    Some(SchemaOrBool::Bool(false)) if items.len() > positions.len() => {
                        self.report(
                            "additionalItems",
                            path,
                            format!("should NOT have more than {} items", positions.len()),
                            json!({ "limit": positions.len() }),
                        );
                    }
                    Some(SchemaOrBool::Schema(additional)) => {
                        for (index, element) in rest {
                            self.visit(additional, element, &path.index(index), &mut Vec::new())?;
                        }
                    }
                    _ => {}
                }
            }
            None => {}
        }

        if let Some(contains) = &schema.contains {
            let mut found = false;
            for (index, element) in items.iter().enumerate() {
                if self.passes(contains, element, &path.index(index), &mut Vec::new())? {
                    found = true;
                    break;
                }
            }
            if !found {
                self.report("contains", path, "should contain a valid item".into(), json!({}));
            }
        }
        Ok(())
    }

    fn visit_object(
        &mut self,
        schema: &Schema,
        map: &Map<String, Value>,
        data: &Value,
        path: &PropertyPath,
        chain: &mut Vec<String>,
    ) -> SchemaResult<()> {
        let count = map.len() as u64;
        if let Some(min) = schema.min_properties.filter(|min| count < *min) {
            self.report(
                "minProperties",
                path,
                format!("should NOT have fewer than {} properties", min),
                json!({ "limit": min }),
            );
        }
        if let Some(max) = schema.max_properties.filter(|max| count > *max) {
            self.report(
                "maxProperties",
                path,
                format!("should NOT have more than {} properties", max),
                json!({ "limit": max }),
            );
        }

        for name in &schema.required {
            if !map.contains_key(name) {
                self.report(
                    "required",
                    &path.key(name.as_str()),
                    "is a required property".into(),
                    json!({ "missingProperty": name }),
                );
            }
        }

        if let Some(properties) = &schema.properties {
            for (name, property) in properties {
                if let Some(value) = map.get(name) {
                    self.visit(property, value, &path.key(name.as_str()), &mut Vec::new())?;
                }
            }
        }

        match &schema.additional_properties {
            Some(SchemaOrBool::Bool(false)) => {
                for name in map.keys().filter(|k| schema.property(k).is_none()) {
                    self.report(
                        "additionalProperties",
                        &path.key(name.as_str()),
                        "should NOT have additional properties".into(),
                        json!({ "additionalProperty": name }),
                    );
                }
            }
            Some(SchemaOrBool::Schema(additional)) => {
                for (name, value) in map.iter().filter(|(k, _)| schema.property(k).is_none()) {
                    self.visit(additional, value, &path.key(name.as_str()), &mut Vec::new())?;
                }
            }
            _ => {}
        }

        if let Some(dependencies) = &schema.dependencies {
            for (trigger, dependency) in dependencies {
                if !map.contains_key(trigger) {
                    continue;
                }
                match dependency {
                    Dependency::Properties(names) => {
                        for missing in names.iter().filter(|n| !map.contains_key(n.as_str())) {
                            self.report(
                                "dependencies",
                                &path.key(missing.as_str()),
                                format!(
                                    "should have property {} when property {} is present",
                                    missing, trigger
                                ),
                                json!({
                                    "property": trigger,
                                    "missingProperty": missing,
                                    "depsCount": names.len(),
                                    "deps": names.join(", "),
                                }),
                            );
                        }
                    }
                    // same data, so the reference chain carries over
                    Dependency::Schema(dependent) => {
                        self.visit(dependent, data, path, chain)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn visit_combinators(
        &mut self,
        schema: &Schema,
        data: &Value,
        path: &PropertyPath,
        chain: &mut Vec<String>,
    ) -> SchemaResult<()> {
        if let Some(parts) = &schema.all_of {
            for part in parts {
                self.visit(part, data, path, chain)?;
            }
        }

        if let Some(options) = schema.any_of.as_ref().filter(|o| !o.is_empty()) {
            let mut matched = false;
            for option in options {
                if self.passes(option, data, path, chain)? {
                    matched = true;
                    break;
                }
            }
            if !matched {
                self.report("anyOf", path, "should match some schema in anyOf".into(), json!({}));
            }
        }

        if let Some(options) = schema.one_of.as_ref().filter(|o| !o.is_empty()) {
            let mut passing = Vec::new();
            for (index, option) in options.iter().enumerate() {
                if self.passes(option, data, path, chain)? {
                    passing.push(index);
                    if passing.len() > 1 {
                        break;
                    }
                }
            }
            if passing.len() != 1 {
                let passing_schemas = if passing.is_empty() { Value::Null } else { json!(passing) };
                self.report(
                    "oneOf",
                    path,
                    "should match exactly one schema in oneOf".into(),
                    json!({ "passingSchemas": passing_schemas }),
                );
            }
        }

        if let Some(negated) = &schema.not {
            if self.passes(negated, data, path, chain)? {
                self.report("not", path, "should NOT be valid".into(), json!({}));
            }
        }
        Ok(())
    }
}

/// Returns `(i, j)` with `j < i` for the last pair of equal items
fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    (0..items.len())
        .rev()
        .find_map(|i| (0..i).rev().find(|&j| deep_equals(&items[i], &items[j])).map(|j| (i, j)))
}

/// Renders whole numbers without a fractional part
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(schema: Value, data: Value) -> Vec<ValidationError> {
        let schema = Schema::from_value(schema).unwrap();
        let definitions = Definitions::from_root(&schema).unwrap();
        validate_against_schema(&schema, &definitions, &data, &FormatRegistry::new()).unwrap()
    }

    fn summary(errors: &[ValidationError]) -> Vec<(String, String)> {
        errors
            .iter()
            .map(|e| (e.property.to_string(), e.message.clone()))
            .collect()
    }

    #[test]
    fn test_required_is_reported_at_the_property() {
        let errors = run(
            json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}),
            json!({}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "required");
        assert_eq!(errors[0].property.to_string(), ".name");
        assert_eq!(errors[0].params, json!({"missingProperty": "name"}));
    }

    #[test]
    fn test_type_and_string_keywords() {
        let errors = run(
            json!({"properties": {
                "age": {"type": "integer"},
                "code": {"type": "string", "minLength": 3, "pattern": "^[A-Z]+$"},
                "email": {"type": "string", "format": "email"}
            }}),
            json!({"age": 1.5, "code": "a1", "email": "nope"}),
        );
        assert_eq!(
            summary(&errors),
            vec![
                (".age".to_string(), "should be integer".to_string()),
                (".code".to_string(), "should NOT be shorter than 3 characters".to_string()),
                (".code".to_string(), "should match pattern \"^[A-Z]+$\"".to_string()),
                (".email".to_string(), "should match format \"email\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_numeric_bounds() {
        let errors = run(
            json!({"type": "number", "minimum": 5, "exclusiveMaximum": 10, "multipleOf": 2}),
            json!(3),
        );
        assert_eq!(errors[0].message, "should be >= 5");
        assert_eq!(errors[0].params, json!({"comparison": ">=", "limit": 5, "exclusive": false}));
        assert_eq!(errors[1].message, "should be multiple of 2");

        let errors = run(json!({"exclusiveMaximum": 10}), json!(10));
        assert_eq!(errors[0].message, "should be < 10");

        assert!(run(json!({"multipleOf": 0.1}), json!(0.3)).is_empty());
    }

    #[test]
    fn test_array_keywords() {
        let errors = run(
            json!({"type": "array", "items": {"type": "string"}, "minItems": 4, "uniqueItems": true}),
            json!(["a", 1, "a"]),
        );
        assert_eq!(
            summary(&errors),
            vec![
                ("".to_string(), "should NOT have fewer than 4 items".to_string()),
                ("".to_string(), "should NOT have duplicate items (items ## 0 and 2 are identical)".to_string()),
                ("[1]".to_string(), "should be string".to_string()),
            ]
        );
    }

    #[test]
    fn test_tuple_items() {
        let schema = json!({"items": [{"type": "string"}, {"type": "number"}], "additionalItems": false});
        let errors = run(schema.clone(), json!(["a", 1, true]));
        assert_eq!(errors[0].name, "additionalItems");
        assert!(run(schema, json!(["a", 1])).is_empty());

        let errors = run(
            json!({"items": [{"type": "string"}], "additionalItems": {"type": "boolean"}}),
            json!(["a", true, 3]),
        );
        assert_eq!(summary(&errors), vec![("[2]".to_string(), "should be boolean".to_string())]);
    }

    #[test]
    fn test_contains() {
        let schema = json!({"contains": {"const": 3}});
        assert!(run(schema.clone(), json!([1, 3])).is_empty());
        assert_eq!(run(schema, json!([1, 2]))[0].name, "contains");
    }

    #[test]
    fn test_additional_properties_false() {
        let errors = run(
            json!({"properties": {"a": {}}, "additionalProperties": false}),
            json!({"a": 1, "first name": 2}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property.to_string(), "['first name']");
        assert_eq!(errors[0].params, json!({"additionalProperty": "first name"}));
    }

    #[test]
    fn test_property_dependencies() {
        let errors = run(
            json!({"dependencies": {"credit_card": ["billing_address"]}}),
            json!({"credit_card": "4111"}),
        );
        assert_eq!(errors[0].name, "dependencies");
        assert_eq!(errors[0].property.to_string(), ".billing_address");
        assert_eq!(
            errors[0].message,
            "should have property billing_address when property credit_card is present"
        );
    }

    #[test]
    fn test_combinators() {
        let one_of = json!({"oneOf": [{"type": "number"}, {"minimum": 0}]});
        let errors = run(one_of.clone(), json!(5));
        assert_eq!(errors[0].params, json!({"passingSchemas": [0, 1]}));
        assert!(run(one_of.clone(), json!(-5)).is_empty());
        assert!(run(one_of, json!("x")).is_empty());
        assert_eq!(
            run(json!({"oneOf": [{"type": "string"}, {"type": "boolean"}]}), json!(1))[0].params,
            json!({"passingSchemas": null})
        );

        assert_eq!(run(json!({"anyOf": [{"type": "string"}]}), json!(1))[0].name, "anyOf");
        assert_eq!(run(json!({"not": {"type": "string"}}), json!("s"))[0].name, "not");
        assert_eq!(
            run(json!({"allOf": [{"type": "string"}, {"maxLength": 1}]}), json!("ab"))[0].name,
            "maxLength"
        );
    }

    #[test]
    fn test_reference_errors() {
        let errors = run(json!({"properties": {"a": {"$ref": "#/definitions/missing"}}}), json!({"a": 1}));
        assert_eq!(errors[0].kind, ErrorKind::SchemaResolution);
        assert_eq!(errors[0].name, "$ref");
        assert_eq!(errors[0].property.to_string(), ".a");

        let errors = run(
            json!({"definitions": {"n": {"type": "number"}}, "properties": {"a": {"$ref": "#/definitions/n"}}}),
            json!({"a": "x"}),
        );
        assert_eq!(errors[0].message, "should be number");
    }

    #[test]
    fn test_cyclic_reference_is_fatal() {
        let schema = Schema::from_value(json!({
            "definitions": {"a": {"$ref": "#/definitions/b"}, "b": {"$ref": "#/definitions/a"}},
            "$ref": "#/definitions/a"
        }))
        .unwrap();
        let definitions = Definitions::from_root(&schema).unwrap();
        let err = validate_against_schema(&schema, &definitions, &json!(1), &FormatRegistry::new()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_recursive_schema_follows_data() {
        let errors = run(
            json!({
                "definitions": {"node": {"type": "object", "properties": {
                    "value": {"type": "number"},
                    "next": {"$ref": "#/definitions/node"}
                }}},
                "$ref": "#/definitions/node"
            }),
            json!({"value": 1, "next": {"value": "two", "next": {"value": 3}}}),
        );
        assert_eq!(summary(&errors), vec![(".next.value".to_string(), "should be number".to_string())]);
    }

    #[test]
    fn test_dependency_back_to_root_is_cyclic() {
        let schema = Schema::from_value(json!({"type": "object", "dependencies": {"a": {"$ref": "#"}}})).unwrap();
        let definitions = Definitions::from_root(&schema).unwrap();
        let err = validate_against_schema(&schema, &definitions, &json!({"a": 1}), &FormatRegistry::new()).unwrap_err();
        assert_eq!(err.code(), crate::schema::SchemaErrorCode::FormSchemaCyclicRef);
    }

    #[test]
    fn test_lookaround_patterns() {
        let errors = run(
            json!({"properties": {
                "user": {"type": "string", "pattern": "^(?!admin).*$"},
                "age": {"type": "integer"}
            }}),
            json!({"user": "admin1", "age": "x"}),
        );
        assert_eq!(
            summary(&errors),
            vec![
                (".user".to_string(), "should match pattern \"^(?!admin).*$\"".to_string()),
                (".age".to_string(), "should be integer".to_string()),
            ]
        );
        assert!(run(json!({"pattern": "^(?!admin).*$"}), json!("bob")).is_empty());
    }
}
