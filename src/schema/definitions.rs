//! Definitions table for `$ref` resolution
//!
//! References are local JSON pointers (`#/definitions/address`,
//! `#/properties/name`, `#`) evaluated against the root schema document.
//! Pointer segments are unescaped (`~1` to `/`, then `~0` to `~`). When a
//! pointer walks through a node that is itself a `$ref`, that reference is
//! followed before descending further.

use indexmap::IndexMap;
use serde_json::{json, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Root document against which references are resolved
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    root: Value,
}

impl Definitions {
    /// An empty table; every reference is unresolvable
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Default::default()),
        }
    }

    /// Builds a table from named definitions, addressable as
    /// `#/definitions/<name>`
    pub fn new(definitions: &IndexMap<String, Schema>) -> SchemaResult<Self> {
        Ok(Self {
            root: json!({ "definitions": serde_json::to_value(definitions)? }),
        })
    }

    /// Builds a table whose root document is the given schema
    pub fn from_root(schema: &Schema) -> SchemaResult<Self> {
        Ok(Self {
            root: schema.to_value()?,
        })
    }

    /// Builds a table from a raw root document
    pub fn from_document(root: Value) -> Self {
        Self { root }
    }

    /// Returns whether the root document carries a `definitions` table
    pub fn has_definitions(&self) -> bool {
        self.root.get("definitions").map_or(false, Value::is_object)
    }

    /// Resolves a reference to its schema
    pub fn find(&self, reference: &str) -> SchemaResult<Schema> {
        let mut seen = Vec::new();
        let node = self.find_node(reference, &mut seen)?;
        Schema::from_value(node.clone())
    }

    fn find_node<'a>(&'a self, reference: &str, seen: &mut Vec<String>) -> SchemaResult<&'a Value> {
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| SchemaError::unsupported_reference(reference))?;

        if seen.iter().any(|r| r == reference) {
            return Err(SchemaError::cyclic_reference(reference));
        }
        seen.push(reference.to_string());

        if pointer.is_empty() {
            return Ok(&self.root);
        }
        let pointer = pointer
            .strip_prefix('/')
            .ok_or_else(|| SchemaError::unresolvable_reference(reference))?;

        let mut current = &self.root;
        for (depth, raw_segment) in pointer.split('/').enumerate() {
            // the root's own `$ref` never redirects a pointer into the document
            while depth > 0 {
                let Some(inner) = current.get("$ref").and_then(Value::as_str) else {
                    break;
                };
                current = self.find_node(inner, seen)?;
            }

            let segment = raw_segment.replace("~1", "/").replace("~0", "~");
            current = match current {
                Value::Object(map) => map.get(&segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| SchemaError::unresolvable_reference(reference))?;
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::types::SchemaType;

    fn sample() -> Definitions {
        Definitions::from_document(json!({
            "definitions": {
                "address": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}}
                },
                "alias": {"$ref": "#/definitions/address"},
                "a/b": {"type": "number"},
                "loop": {"$ref": "#/definitions/loop2"},
                "loop2": {"$ref": "#/definitions/loop"}
            }
        }))
    }

    #[test]
    fn test_find_definition() {
        let schema = sample().find("#/definitions/address").unwrap();
        assert!(schema.property("city").is_some());
    }

    #[test]
    fn test_find_nested_pointer() {
        let schema = sample().find("#/definitions/address/properties/city").unwrap();
        assert_eq!(
            schema.schema_type.unwrap().names(),
            SchemaType::String.type_name()
        );
    }

    #[test]
    fn test_pointer_walks_through_references() {
        let schema = sample().find("#/definitions/alias/properties/city").unwrap();
        assert!(schema.schema_type.is_some());
    }

    #[test]
    fn test_escaped_segments() {
        let schema = sample().find("#/definitions/a~1b").unwrap();
        assert!(schema.schema_type.is_some());
    }

    #[test]
    fn test_missing_definition() {
        let err = sample().find("#/definitions/nope").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::FormSchemaUnresolvableRef);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_remote_reference_unsupported() {
        let err = sample().find("http://example.com/schema.json").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::FormSchemaUnsupportedRef);
    }

    #[test]
    fn test_pointer_cycle_is_fatal() {
        let err = sample().find("#/definitions/loop/properties").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::FormSchemaCyclicRef);
    }

    #[test]
    fn test_root_reference_does_not_redirect_pointers() {
        let defs = Definitions::from_document(json!({
            "$ref": "#/definitions/node",
            "definitions": {"node": {"type": "object"}}
        }));
        assert!(defs.find("#/definitions/node").is_ok());
    }

    #[test]
    fn test_named_table() {
        let mut table = IndexMap::new();
        table.insert("name".to_string(), Schema::typed(SchemaType::String));
        let defs = Definitions::new(&table).unwrap();
        assert!(defs.has_definitions());
        assert!(defs.find("#/definitions/name").is_ok());
    }
}
