//! Schema inspection helpers used by the form layer

use serde::Serialize;
use serde_json::Value;

use super::definitions::Definitions;
use super::errors::{SchemaError, SchemaResult};
use super::resolver::retrieve_schema;
use super::types::{Items, Schema, SchemaOrBool, SchemaType, TypeSet};
use crate::ui::UiSchema;

/// Returns the effective type of a schema.
///
/// An explicit single type wins. A `[T, "null"]` pair yields `T`. Without a
/// type, `const` yields the constant's type and `properties` or
/// `additionalProperties` yield `object`.
pub fn get_schema_type(schema: &Schema) -> Option<SchemaType> {
    match &schema.schema_type {
        Some(TypeSet::Single(t)) => Some(*t),
        Some(TypeSet::Multiple(types)) => {
            if types.len() == 2 && types.contains(&SchemaType::Null) {
                types.iter().copied().find(|t| *t != SchemaType::Null)
            } else {
                types.first().copied()
            }
        }
        None => {
            if let Some(constant) = &schema.constant {
                Some(guess_type(constant))
            } else if schema.properties.is_some() || schema.additional_properties.is_some() {
                Some(SchemaType::Object)
            } else {
                None
            }
        }
    }
}

/// Returns the JSON Schema type of a value. Numbers are always `number`.
pub fn guess_type(value: &Value) -> SchemaType {
    match value {
        Value::Null => SchemaType::Null,
        Value::Bool(_) => SchemaType::Boolean,
        Value::Number(_) => SchemaType::Number,
        Value::String(_) => SchemaType::String,
        Value::Array(_) => SchemaType::Array,
        Value::Object(_) => SchemaType::Object,
    }
}

/// Returns whether the schema admits exactly one value
pub fn is_constant(schema: &Schema) -> bool {
    schema.constant.is_some() || schema.enum_values.as_ref().map_or(false, |e| e.len() == 1)
}

/// Returns the single value a constant schema admits
pub fn to_constant(schema: &Schema) -> SchemaResult<Value> {
    if let Some(values) = &schema.enum_values {
        if values.len() == 1 {
            return Ok(values[0].clone());
        }
    }
    schema.constant.clone().ok_or_else(SchemaError::not_constant)
}

/// Returns whether the schema is rendered as a selection among values
pub fn is_select(schema: &Schema, definitions: &Definitions) -> SchemaResult<bool> {
    let schema = retrieve_schema(schema, definitions, &Value::Null)?;
    if schema.enum_values.is_some() {
        return Ok(true);
    }
    Ok(schema
        .combinator_options()
        .map_or(false, |options| options.iter().all(is_constant)))
}

/// Returns whether the schema is an array of unique selectable values
pub fn is_multi_select(schema: &Schema, definitions: &Definitions) -> SchemaResult<bool> {
    if schema.unique_items != Some(true) {
        return Ok(false);
    }
    match &schema.items {
        Some(Items::Single(item)) => is_select(item, definitions),
        _ => Ok(false),
    }
}

/// Returns whether `items` is a list of fixed-position schemas
pub fn is_fixed_items(schema: &Schema) -> bool {
    matches!(&schema.items, Some(Items::Tuple(items)) if !items.is_empty())
}

/// Returns whether elements past the fixed positions are accepted by a schema
pub fn allow_additional_items(schema: &Schema) -> bool {
    matches!(schema.additional_items, Some(SchemaOrBool::Schema(_)))
}

/// Returns whether the schema is edited as a list of uploaded files: the
/// UI asks for the `files` widget, or the items are `data-url` strings
pub fn is_files_array(schema: &Schema, ui: &UiSchema, definitions: &Definitions) -> SchemaResult<bool> {
    if ui.widget_name() == Some("files") {
        return Ok(true);
    }
    match &schema.items {
        Some(Items::Single(item)) => {
            let item = retrieve_schema(item, definitions, &Value::Null)?;
            Ok(get_schema_type(&item) == Some(SchemaType::String) && item.format.as_deref() == Some("data-url"))
        }
        _ => Ok(false),
    }
}

/// A selectable option
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

/// Lists the options of a select schema. `enum` values take their labels
/// from `enumNames`; `oneOf`/`anyOf` constants take theirs from `title`.
pub fn options_list(schema: &Schema) -> SchemaResult<Vec<SelectOption>> {
    if let Some(values) = &schema.enum_values {
        let names = schema.extra.get("enumNames").and_then(Value::as_array);
        return Ok(values
            .iter()
            .enumerate()
            .map(|(i, value)| SelectOption {
                label: names
                    .and_then(|n| n.get(i))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| display_value(value)),
                value: value.clone(),
            })
            .collect());
    }

    let Some(options) = schema.combinator_options() else {
        return Ok(Vec::new());
    };
    options
        .iter()
        .map(|option| {
            let value = to_constant(option)?;
            let label = option.title.clone().unwrap_or_else(|| display_value(&value));
            Ok(SelectOption { label, value })
        })
        .collect()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric input attributes derived from a schema
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Returns the range attributes of a numeric schema
pub fn range_spec(schema: &Schema) -> RangeSpec {
    RangeSpec {
        min: schema.minimum,
        max: schema.maximum,
        step: schema.multiple_of,
    }
}

/// Converts text typed into a numeric input.
///
/// Returns `None` for empty input. Text that would lose information as a
/// number (`"3."`, `"3.0"`, `"3.10"`) or that is not numeric stays a string.
pub fn as_number(value: Option<&str>) -> Option<Value> {
    let Some(text) = value else {
        return Some(Value::Null);
    };
    if text.is_empty() {
        return None;
    }
    if text.ends_with('.') || has_trailing_fraction_zero(text) {
        return Some(Value::String(text.to_string()));
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(Value::from(n)),
        _ => Some(Value::String(text.to_string())),
    }
}

fn has_trailing_fraction_zero(text: &str) -> bool {
    match text.split_once('.') {
        Some((_, fraction)) => {
            fraction.ends_with('0') && fraction.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Orders property names by a `ui:order` list.
///
/// Names in `order` that are not properties are skipped. A single `*`
/// stands for every property not listed; without it every property must be
/// listed.
pub fn order_properties<S: AsRef<str>>(properties: &[S], order: Option<&[String]>) -> SchemaResult<Vec<String>> {
    let properties: Vec<&str> = properties.iter().map(AsRef::as_ref).collect();
    let Some(order) = order else {
        return Ok(properties.into_iter().map(str::to_string).collect());
    };

    let listed: Vec<&str> = order
        .iter()
        .map(String::as_str)
        .filter(|name| *name == "*" || properties.contains(name))
        .collect();
    let rest: Vec<&str> = properties
        .iter()
        .copied()
        .filter(|name| !listed.contains(name))
        .collect();

    let wildcards = listed.iter().filter(|name| **name == "*").count();
    match wildcards {
        0 if rest.is_empty() => Ok(listed.into_iter().map(str::to_string).collect()),
        0 => {
            let missing = rest.iter().map(|n| format!("'{}'", n)).collect::<Vec<_>>();
            let noun = if missing.len() > 1 { "properties" } else { "property" };
            Err(SchemaError::invalid_order(format!(
                "does not contain {} {}",
                noun,
                missing.join(", ")
            )))
        }
        1 => Ok(listed
            .into_iter()
            .flat_map(|name| {
                if name == "*" {
                    rest.clone()
                } else {
                    vec![name]
                }
            })
            .map(str::to_string)
            .collect()),
        _ => Err(SchemaError::invalid_order("contains more than one wildcard item")),
    }
}

/// Structural equality of two values
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equals(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).map_or(false, |w| deep_equals(v, w)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    #[test]
    fn test_get_schema_type() {
        assert_eq!(get_schema_type(&schema(json!({"type": "string"}))), Some(SchemaType::String));
        assert_eq!(
            get_schema_type(&schema(json!({"type": ["null", "integer"]}))),
            Some(SchemaType::Integer)
        );
        assert_eq!(get_schema_type(&schema(json!({"const": 3}))), Some(SchemaType::Number));
        assert_eq!(
            get_schema_type(&schema(json!({"properties": {}}))),
            Some(SchemaType::Object)
        );
        assert_eq!(get_schema_type(&schema(json!({}))), None);
    }

    #[test]
    fn test_constants() {
        assert!(is_constant(&schema(json!({"enum": ["only"]}))));
        assert!(is_constant(&schema(json!({"const": null}))));
        assert!(!is_constant(&schema(json!({"enum": ["a", "b"]}))));
        assert_eq!(to_constant(&schema(json!({"const": "x"}))).unwrap(), json!("x"));
        assert!(to_constant(&schema(json!({"type": "string"}))).is_err());
    }

    #[test]
    fn test_is_select() {
        let defs = Definitions::empty();
        assert!(is_select(&schema(json!({"enum": [1, 2]})), &defs).unwrap());
        assert!(is_select(
            &schema(json!({"oneOf": [{"const": "a"}, {"const": "b"}]})),
            &defs
        )
        .unwrap());
        assert!(!is_select(&schema(json!({"type": "string"})), &defs).unwrap());
    }

    #[test]
    fn test_is_multi_select() {
        let defs = Definitions::empty();
        let multi = schema(json!({
            "type": "array",
            "uniqueItems": true,
            "items": {"type": "string", "enum": ["a", "b"]}
        }));
        assert!(is_multi_select(&multi, &defs).unwrap());

        let plain = schema(json!({"type": "array", "items": {"type": "string"}}));
        assert!(!is_multi_select(&plain, &defs).unwrap());
    }

    #[test]
    fn test_is_files_array() {
        let defs = Definitions::empty();
        let files = schema(json!({"type": "array", "items": {"type": "string", "format": "data-url"}}));
        assert!(is_files_array(&files, &UiSchema::new(), &defs).unwrap());

        let strings = schema(json!({"type": "array", "items": {"type": "string"}}));
        assert!(!is_files_array(&strings, &UiSchema::new(), &defs).unwrap());
        assert!(is_files_array(&strings, &UiSchema::new().with_widget("files"), &defs).unwrap());
    }

    #[test]
    fn test_options_list() {
        let from_enum = options_list(&schema(json!({
            "enum": ["a", "b"],
            "enumNames": ["Alpha"]
        })))
        .unwrap();
        assert_eq!(from_enum[0].label, "Alpha");
        assert_eq!(from_enum[1].label, "b");

        let from_one_of = options_list(&schema(json!({
            "oneOf": [{"const": 1, "title": "One"}, {"enum": [2]}]
        })))
        .unwrap();
        assert_eq!(from_one_of[0].label, "One");
        assert_eq!(from_one_of[1].value, json!(2));
        assert_eq!(from_one_of[1].label, "2");
    }

    #[test]
    fn test_fixed_and_additional_items() {
        let s = schema(json!({"items": [{"type": "string"}], "additionalItems": {"type": "number"}}));
        assert!(is_fixed_items(&s));
        assert!(allow_additional_items(&s));
        assert!(!allow_additional_items(&schema(json!({"additionalItems": true}))));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(Some("")), None);
        assert_eq!(as_number(None), Some(Value::Null));
        assert_eq!(as_number(Some("42")), Some(json!(42)));
        assert_eq!(as_number(Some("4.5")), Some(json!(4.5)));
        assert_eq!(as_number(Some("4.")), Some(json!("4.")));
        assert_eq!(as_number(Some("4.0")), Some(json!("4.0")));
        assert_eq!(as_number(Some("4.10")), Some(json!("4.10")));
        assert_eq!(as_number(Some("abc")), Some(json!("abc")));
    }

    #[test]
    fn test_range_spec() {
        let spec = range_spec(&schema(json!({"minimum": 1, "maximum": 9, "multipleOf": 2})));
        assert_eq!(spec, RangeSpec { min: Some(1.0), max: Some(9.0), step: Some(2.0) });
    }

    #[test]
    fn test_order_properties_wildcard() {
        let props = ["a", "b", "c", "d"];
        let order = vec!["c".to_string(), "*".to_string(), "a".to_string()];
        assert_eq!(order_properties(&props, Some(&order)).unwrap(), vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_order_properties_skips_unknown_names() {
        let props = ["a", "b"];
        let order = vec!["b".to_string(), "ghost".to_string(), "a".to_string()];
        assert_eq!(order_properties(&props, Some(&order)).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_order_properties_errors() {
        let props = ["a", "b"];
        let incomplete = vec!["a".to_string()];
        let err = order_properties(&props, Some(&incomplete)).unwrap_err();
        assert!(err.message().contains("'b'"));

        let doubled = vec!["*".to_string(), "*".to_string()];
        let err = order_properties(&props, Some(&doubled)).unwrap_err();
        assert_eq!(err.code().code(), "FORM_SCHEMA_INVALID_ORDER");
    }

    #[test]
    fn test_deep_equals_numbers() {
        assert!(deep_equals(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!deep_equals(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }
}
