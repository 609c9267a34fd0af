//! Schema and value merging
//!
//! Merges operate on the JSON form of schemas so that opaque keywords in
//! [`Schema::extra`] are merged like every other key.

use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::{Schema, SchemaType};
use super::utils::get_schema_type;

/// Recursively merges `b` into `a`. Nested objects merge, arrays are
/// concatenated when `concat_arrays` is set, any other value from `b` wins.
pub fn merge_objects(a: &Map<String, Value>, b: &Map<String, Value>, concat_arrays: bool) -> Map<String, Value> {
    let mut acc = a.clone();
    for (key, right) in b {
        let merged = match (a.get(key), right) {
            (Some(Value::Object(left)), Value::Object(right)) => {
                Value::Object(merge_objects(left, right, concat_arrays))
            }
            (Some(Value::Array(left)), Value::Array(right)) if concat_arrays => {
                Value::Array(left.iter().chain(right.iter()).cloned().collect())
            }
            _ => right.clone(),
        };
        acc.insert(key.clone(), merged);
    }
    acc
}

/// Shallow overlay: keys present on `top` replace those on `base`
pub fn overlay(base: &Schema, top: &Schema) -> SchemaResult<Schema> {
    let mut merged = as_object(base.to_value()?)?;
    for (key, value) in as_object(top.to_value()?)? {
        merged.insert(key, value);
    }
    Schema::from_value(Value::Object(merged))
}

/// Deep schema merge. Object keywords merge recursively, `required` lists
/// are unioned when either side describes an object, everything else is
/// taken from `right`.
pub fn merge_schemas(left: &Schema, right: &Schema) -> SchemaResult<Schema> {
    let unions_required = get_schema_type(left) == Some(SchemaType::Object)
        || get_schema_type(right) == Some(SchemaType::Object);
    let merged = merge_schema_maps(
        &as_object(left.to_value()?)?,
        &as_object(right.to_value()?)?,
        unions_required,
    );
    Schema::from_value(Value::Object(merged))
}

fn merge_schema_maps(
    left: &Map<String, Value>,
    right: &Map<String, Value>,
    unions_required: bool,
) -> Map<String, Value> {
    let mut acc = left.clone();
    for (key, r) in right {
        let merged = match (left.get(key), r) {
            (Some(Value::Object(l)), Value::Object(r)) => {
                let nested_object = is_object_schema(l) || is_object_schema(r);
                Value::Object(merge_schema_maps(l, r, nested_object))
            }
            (Some(Value::Array(l)), Value::Array(r)) if key == "required" && unions_required => {
                let mut union = l.clone();
                for item in r {
                    if !union.contains(item) {
                        union.push(item.clone());
                    }
                }
                Value::Array(union)
            }
            _ => r.clone(),
        };
        acc.insert(key.clone(), merged);
    }
    acc
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    map.get("type").and_then(Value::as_str) == Some("object") || map.contains_key("properties")
}

/// Folds every `allOf` subschema into the parent. Fails when the declared
/// types of two parts cannot both hold.
pub fn merge_all_of(schema: &Schema) -> SchemaResult<Schema> {
    let mut merged = schema.clone();
    let parts = merged.all_of.take().unwrap_or_default();

    for part in &parts {
        if let (Some(a), Some(b)) = (&merged.schema_type, &part.schema_type) {
            if !a.iter().any(|t| b.contains(*t)) {
                return Err(SchemaError::malformed(format!(
                    "allOf combines incompatible types {} and {}",
                    a.names(),
                    b.names()
                )));
            }
        }
        let mut part = part.clone();
        part.all_of = None;
        merged = merge_schemas(&merged, &part)?;
    }

    Ok(merged)
}

fn as_object(value: Value) -> SchemaResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SchemaError::malformed(format!("expected an object, got {}", other))),
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
    fn test_merge_objects_recursive() {
        let a = json!({"a": {"x": 1}, "list": [1]});
        let b = json!({"a": {"y": 2}, "list": [2], "c": true});
        let merged = merge_objects(a.as_object().unwrap(), b.as_object().unwrap(), false);
        assert_eq!(Value::Object(merged), json!({"a": {"x": 1, "y": 2}, "list": [2], "c": true}));
    }

    #[test]
    fn test_merge_objects_concat_arrays() {
        let a = json!({"__errors": ["one"]});
        let b = json!({"__errors": ["two"]});
        let merged = merge_objects(a.as_object().unwrap(), b.as_object().unwrap(), true);
        assert_eq!(Value::Object(merged), json!({"__errors": ["one", "two"]}));
    }

    #[test]
    fn test_overlay_local_keywords_win() {
        let base = schema(json!({"type": "string", "title": "Base", "minLength": 2}));
        let top = schema(json!({"title": "Local"}));
        let merged = overlay(&base, &top).unwrap();
        assert_eq!(merged.title.as_deref(), Some("Local"));
        assert_eq!(merged.min_length, Some(2));
    }

    #[test]
    fn test_merge_schemas_unions_required() {
        let left = schema(json!({"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]}));
        let right = schema(json!({"properties": {"b": {"type": "number"}}, "required": ["b", "a"]}));
        let merged = merge_schemas(&left, &right).unwrap();
        assert_eq!(merged.required, vec!["a", "b"]);
        assert_eq!(merged.properties.unwrap().len(), 2);
    }

    #[test]
    fn test_merge_all_of() {
        let s = schema(json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]},
                {"properties": {"b": {"type": "string"}}, "required": ["b"]}
            ]
        }));
        let merged = merge_all_of(&s).unwrap();
        assert!(merged.all_of.is_none());
        assert_eq!(merged.required, vec!["a", "b"]);
    }

    #[test]
    fn test_merge_all_of_type_conflict() {
        let s = schema(json!({
            "type": "string",
            "allOf": [{"type": "number"}]
        }));
        assert!(merge_all_of(&s).is_err());
    }
}
