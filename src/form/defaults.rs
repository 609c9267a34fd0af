//! Default form state
//!
//! Computes the defaults a schema declares and merges them with the data a
//! caller already has. Data always wins over defaults; `null` stands for a
//! missing value.
//!
//! # Rules
//!
//! - A node's own `default` replaces the one inherited from its parent,
//!   unless both are objects, in which case they merge with the node's keys
//!   winning
//! - Object nodes produce an object, one entry per declared property that
//!   has a default (or `null` for every property when undefined values are
//!   included)
//! - Fixed-position `items` compute each position independently
//! - `minItems` pads missing elements with the item schema's default;
//!   multi-select arrays are never padded and default to `[]`
//! - Undeclared data keys survive unless `additionalProperties` is `false`
//! - Merging repeats until the state stops changing, so defaults that
//!   trigger `dependencies` or steer `oneOf` selection take effect at once

use serde_json::{Map, Value};

use crate::observability::{trace_event, Event};
use crate::schema::utils::{get_schema_type, is_fixed_items, is_multi_select};
use crate::schema::{merge_objects, Definitions, Items, Schema, SchemaError, SchemaResolver, SchemaResult, SchemaType};

/// Nesting limit for default computation
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Most elements `minItems` padding may synthesise
pub const DEFAULT_MAX_PADDED_ITEMS: usize = 10_000;

/// Computes defaults and merges them into form data
pub struct DefaultMerger<'a> {
    resolver: SchemaResolver<'a>,
    include_undefined: bool,
    max_depth: usize,
    max_padded_items: usize,
}

impl<'a> DefaultMerger<'a> {
    pub fn new(definitions: &'a Definitions) -> Self {
        Self {
            resolver: SchemaResolver::new(definitions),
            include_undefined: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_padded_items: DEFAULT_MAX_PADDED_ITEMS,
        }
    }

    /// Emit `null` for properties with neither data nor default
    pub fn include_undefined(mut self, include: bool) -> Self {
        self.include_undefined = include;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_padded_items(mut self, max_padded_items: usize) -> Self {
        self.max_padded_items = max_padded_items;
        self
    }

    /// Computes the defaults declared below `schema`.
    ///
    /// `raw_data` steers reference, dependency and combinator resolution and
    /// fixes the length of arrays that already have data. Returns `None` when
    /// nothing is defaulted.
    pub fn compute_defaults(
        &self,
        schema: &Schema,
        parent_defaults: Option<&Value>,
        raw_data: &Value,
    ) -> SchemaResult<Option<Value>> {
        let mut expanding = Vec::new();
        if let Some(reference) = &schema.reference {
            expanding.push(reference.clone());
        }
        self.compute(schema, parent_defaults, raw_data, 0, &mut expanding)
    }

    /// Merges the defaults of `schema` into `form_data`.
    ///
    /// # Errors
    ///
    /// - Reference failures while retrieving the schema
    /// - Nesting deeper than the configured maximum
    /// - `minItems` above the padding limit
    pub fn default_form_state(&self, schema: &Schema, form_data: &Value) -> SchemaResult<Value> {
        let mut state = self.merge_pass(schema, form_data)?;
        let mut passes = 1;
        while passes <= self.max_depth {
            let next = self.merge_pass(schema, &state)?;
            if next == state {
                break;
            }
            state = next;
            passes += 1;
        }

        let include_undefined = self.include_undefined.to_string();
        let passes = passes.to_string();
        trace_event(
            Event::DefaultsComputed,
            &[("include_undefined", include_undefined.as_str()), ("passes", passes.as_str())],
        );
        Ok(state)
    }

    /// One retrieve, compute and merge round over `form_data`
    fn merge_pass(&self, schema: &Schema, form_data: &Value) -> SchemaResult<Value> {
        let retrieved = self.resolver.retrieve(schema, form_data)?;
        let mut expanding = Vec::new();
        if let Some(reference) = &schema.reference {
            expanding.push(reference.clone());
        }
        let defaults = self.compute(&retrieved, None, form_data, 0, &mut expanding)?;

        let state = match form_data {
            Value::Null => defaults.unwrap_or(Value::Null),
            Value::Object(_) | Value::Array(_) => {
                self.merge_with_data(Some(&retrieved), defaults.as_ref(), form_data)?
            }
            primitive => primitive.clone(),
        };
        Ok(state)
    }

    fn compute(
        &self,
        schema: &Schema,
        parent: Option<&Value>,
        data: &Value,
        depth: usize,
        expanding: &mut Vec<String>,
    ) -> SchemaResult<Option<Value>> {
        if depth > self.max_depth {
            return Err(SchemaError::depth_exceeded(self.max_depth));
        }

        let parent = parent.filter(|v| !v.is_null());
        let defaults = match (parent, &schema.default) {
            (Some(Value::Object(inherited)), Some(Value::Object(own))) => {
                Some(Value::Object(merge_objects(inherited, own, false)))
            }
            (_, Some(own)) => Some(own.clone()),
            (inherited, None) => inherited.cloned(),
        };

        if schema.needs_retrieval() {
            if let Some(reference) = &schema.reference {
                // a recursive reference with no data below it has nothing to default
                if data.is_null() && expanding.contains(reference) {
                    return Ok(defaults);
                }
            }
            let retrieved = self.resolver.retrieve(schema, data)?;
            let pushed = schema.reference.clone();
            if let Some(reference) = &pushed {
                expanding.push(reference.clone());
            }
            let result = self.compute(&retrieved, defaults.as_ref(), data, depth + 1, expanding);
            if pushed.is_some() {
                expanding.pop();
            }
            return result;
        }

        if schema.combinator_options().is_some() {
            let resolved = self.resolver.resolve_combinator(schema, data)?;
            return self.compute(&resolved, defaults.as_ref(), data, depth + 1, expanding);
        }

        match get_schema_type(schema) {
            Some(SchemaType::Object) => self
                .object_defaults(schema, defaults.as_ref(), data, depth, expanding)
                .map(Some),
            Some(SchemaType::Array) => self.array_defaults(schema, defaults, data, depth, expanding),
            _ => Ok(defaults),
        }
    }

    fn object_defaults(
        &self,
        schema: &Schema,
        defaults: Option<&Value>,
        data: &Value,
        depth: usize,
        expanding: &mut Vec<String>,
    ) -> SchemaResult<Value> {
        let inherited = defaults.and_then(Value::as_object);
        let mut acc = Map::new();

        for (key, property) in schema.properties.iter().flatten() {
            let computed = self.compute(
                property,
                inherited.and_then(|d| d.get(key)),
                data.get(key).unwrap_or(&Value::Null),
                depth + 1,
                expanding,
            )?;
            match computed {
                Some(value) => {
                    acc.insert(key.clone(), value);
                }
                None if self.include_undefined => {
                    acc.insert(key.clone(), Value::Null);
                }
                None => {}
            }
        }

        if let Some(inherited) = inherited {
            if schema.allows_additional_properties() {
                for (key, value) in inherited {
                    if !acc.contains_key(key) && schema.property(key).is_none() {
                        acc.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        Ok(Value::Object(acc))
    }

    fn array_defaults(
        &self,
        schema: &Schema,
        defaults: Option<Value>,
        data: &Value,
        depth: usize,
        expanding: &mut Vec<String>,
    ) -> SchemaResult<Option<Value>> {
        let inherited = defaults.as_ref().and_then(Value::as_array);
        let mut elements: Option<Vec<Value>> = None;

        if let Some(Items::Tuple(items)) = schema.items.as_ref().filter(|_| is_fixed_items(schema)) {
            let mut positions = Vec::with_capacity(items.len());
            let mut any = inherited.is_some();
            for (index, item) in items.iter().enumerate() {
                let computed = self.compute(
                    item,
                    inherited.and_then(|d| d.get(index)),
                    &Value::Null,
                    depth + 1,
                    expanding,
                )?;
                any |= computed.is_some();
                positions.push(computed.unwrap_or(Value::Null));
            }
            if let Some(inherited) = inherited {
                positions.extend(inherited.iter().skip(items.len()).cloned());
            }
            if any {
                elements = Some(positions);
            }
        } else if let Some(inherited) = inherited {
            let mut mapped = Vec::with_capacity(inherited.len());
            for (index, element) in inherited.iter().enumerate() {
                let computed = match schema.item_schema(index) {
                    Some(item) => self.compute(item, Some(element), &Value::Null, depth + 1, expanding)?,
                    None => None,
                };
                mapped.push(computed.unwrap_or_else(|| element.clone()));
            }
            elements = Some(mapped);
        }

        if let Value::Array(data_items) = data {
            let mut mapped = Vec::with_capacity(data_items.len());
            for (index, element) in data_items.iter().enumerate() {
                let base = elements.as_ref().and_then(|e| e.get(index));
                let computed = match schema.item_schema(index) {
                    Some(item) => self.compute(item, base, element, depth + 1, expanding)?,
                    None => base.cloned(),
                };
                mapped.push(computed.unwrap_or(Value::Null));
            }
            elements = Some(mapped);
        }

        let min_items = usize::try_from(schema.min_items.unwrap_or(0)).unwrap_or(usize::MAX);
        if min_items > 0 {
            if is_multi_select(schema, self.resolver.definitions())? {
                return Ok(Some(Value::Array(elements.unwrap_or_default())));
            }
            let mut padded = elements.unwrap_or_default();
            if padded.len() < min_items {
                if min_items > self.max_padded_items {
                    return Err(SchemaError::item_limit_exceeded(min_items, self.max_padded_items));
                }
                let filler_schema = match &schema.items {
                    Some(Items::Tuple(_)) => schema.additional_items.as_ref().and_then(|a| a.schema()),
                    Some(Items::Single(item)) => Some(&**item),
                    None => None,
                };
                let filler = match filler_schema {
                    Some(filler_schema) => self.compute(filler_schema, None, &Value::Null, depth + 1, expanding)?,
                    None => None,
                };
                padded.resize(min_items, filler.unwrap_or(Value::Null));
            }
            return Ok(Some(Value::Array(padded)));
        }

        Ok(elements.map(Value::Array).or(defaults))
    }

    /// Overlays `data` on `defaults`. `schema` is the retrieved schema of the
    /// node, when one applies.
    fn merge_with_data(&self, schema: Option<&Schema>, defaults: Option<&Value>, data: &Value) -> SchemaResult<Value> {
        match data {
            Value::Null => Ok(defaults.cloned().unwrap_or(Value::Null)),
            Value::Array(items) => {
                let base = defaults.and_then(Value::as_array);
                let mut merged = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let child = match schema.and_then(|s| s.item_schema(index)) {
                        Some(item_schema) => Some(self.resolver.retrieve(item_schema, item)?),
                        None => None,
                    };
                    merged.push(self.merge_with_data(child.as_ref(), base.and_then(|b| b.get(index)), item)?);
                }
                Ok(Value::Array(merged))
            }
            Value::Object(entries) => {
                let base = defaults.and_then(Value::as_object);
                let mut merged = base.cloned().unwrap_or_default();
                let closed = schema.map_or(false, |s| !s.allows_additional_properties());
                for (key, value) in entries {
                    let declared = schema.and_then(|s| s.property(key));
                    if declared.is_none() && closed {
                        continue;
                    }
                    let child = match declared {
                        Some(property) => Some(self.resolver.retrieve(property, value)?),
                        None => None,
                    };
                    let value = self.merge_with_data(child.as_ref(), base.and_then(|b| b.get(key)), value)?;
                    merged.insert(key.clone(), value);
                }
                Ok(Value::Object(merged))
            }
            primitive => Ok(primitive.clone()),
        }
    }
}

/// Computes the defaults declared below `schema`, see
/// [`DefaultMerger::compute_defaults`]
pub fn compute_defaults(
    schema: &Schema,
    parent_defaults: Option<&Value>,
    definitions: &Definitions,
    raw_data: &Value,
    include_undefined: bool,
) -> SchemaResult<Option<Value>> {
    DefaultMerger::new(definitions)
        .include_undefined(include_undefined)
        .compute_defaults(schema, parent_defaults, raw_data)
}

/// Merges the defaults of `schema` into `form_data`
pub fn get_default_form_state(
    schema: &Schema,
    form_data: &Value,
    definitions: &Definitions,
    include_undefined: bool,
) -> SchemaResult<Value> {
    DefaultMerger::new(definitions)
        .include_undefined(include_undefined)
        .default_form_state(schema, form_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    fn state(schema_value: Value, data: Value) -> Value {
        let s = schema(schema_value);
        let definitions = Definitions::from_root(&s).unwrap();
        get_default_form_state(&s, &data, &definitions, false).unwrap()
    }

    #[test]
    fn test_property_default() {
        let result = state(
            json!({
                "type": "object",
                "properties": {"name": {"type": "string", "default": "x"}},
                "required": ["name"]
            }),
            json!({}),
        );
        assert_eq!(result, json!({"name": "x"}));
    }

    #[test]
    fn test_data_wins_including_falsy_values() {
        let s = json!({
            "type": "object",
            "properties": {
                "n": {"type": "number", "default": 5},
                "b": {"type": "boolean", "default": true},
                "s": {"type": "string", "default": "x"}
            }
        });
        let result = state(s, json!({"n": 0, "b": false, "s": ""}));
        assert_eq!(result, json!({"n": 0, "b": false, "s": ""}));
    }

    #[test]
    fn test_primitive_root_keeps_data() {
        assert_eq!(state(json!({"type": "number", "default": 3}), json!(0)), json!(0));
        assert_eq!(state(json!({"type": "number", "default": 3}), Value::Null), json!(3));
    }

    #[test]
    fn test_nested_object_defaults() {
        let result = state(
            json!({
                "type": "object",
                "properties": {
                    "address": {
                        "type": "object",
                        "properties": {
                            "city": {"type": "string", "default": "Paris"},
                            "zip": {"type": "string"}
                        }
                    }
                }
            }),
            Value::Null,
        );
        assert_eq!(result, json!({"address": {"city": "Paris"}}));
    }

    #[test]
    fn test_parent_object_default_merges_with_child_default() {
        let result = state(
            json!({
                "type": "object",
                "default": {"inner": {"a": 1, "b": 1}},
                "properties": {
                    "inner": {
                        "type": "object",
                        "default": {"b": 2, "c": 2},
                        "properties": {
                            "a": {"type": "number"},
                            "b": {"type": "number"},
                            "c": {"type": "number"}
                        }
                    }
                }
            }),
            Value::Null,
        );
        assert_eq!(result, json!({"inner": {"a": 1, "b": 2, "c": 2}}));
    }

    #[test]
    fn test_include_undefined_values() {
        let s = schema(json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "string", "default": "b"}}
        }));
        let definitions = Definitions::empty();
        let result = get_default_form_state(&s, &Value::Null, &definitions, true).unwrap();
        assert_eq!(result, json!({"a": null, "b": "b"}));
    }

    #[test]
    fn test_reference_defaults() {
        let result = state(
            json!({
                "definitions": {"name": {"type": "string", "default": "anon"}},
                "type": "object",
                "properties": {"first": {"$ref": "#/definitions/name"}}
            }),
            json!({}),
        );
        assert_eq!(result, json!({"first": "anon"}));
    }

    #[test]
    fn test_min_items_pads_with_item_default() {
        let result = state(
            json!({
                "type": "array",
                "minItems": 2,
                "items": {"type": "string", "default": "x"}
            }),
            Value::Null,
        );
        assert_eq!(result, json!(["x", "x"]));
    }

    #[test]
    fn test_min_items_keeps_existing_data() {
        let result = state(
            json!({"type": "array", "minItems": 2, "items": {"type": "string", "default": "x"}}),
            json!(["a"]),
        );
        assert_eq!(result, json!(["a"]));
    }

    #[test]
    fn test_multi_select_defaults_to_empty() {
        let result = state(
            json!({
                "type": "array",
                "minItems": 1,
                "uniqueItems": true,
                "items": {"type": "string", "enum": ["a", "b"]}
            }),
            Value::Null,
        );
        assert_eq!(result, json!([]));
    }

    #[test]
    fn test_fixed_items_defaults() {
        let result = state(
            json!({
                "type": "array",
                "items": [
                    {"type": "string", "default": "s"},
                    {"type": "number", "default": 1}
                ]
            }),
            Value::Null,
        );
        assert_eq!(result, json!(["s", 1]));
    }

    #[test]
    fn test_array_data_gets_item_defaults() {
        let result = state(
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {"flag": {"type": "boolean", "default": true}}
                }
            }),
            json!([{}, {"flag": false}]),
        );
        assert_eq!(result, json!([{"flag": true}, {"flag": false}]));
    }

    #[test]
    fn test_closed_object_drops_undeclared_data() {
        let result = state(
            json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {"a": {"type": "string"}}
            }),
            json!({"a": "x", "extra": 1}),
        );
        assert_eq!(result, json!({"a": "x"}));
    }

    #[test]
    fn test_open_object_keeps_undeclared_data() {
        let result = state(
            json!({"type": "object", "properties": {"a": {"type": "string"}}}),
            json!({"extra": 1}),
        );
        assert_eq!(result, json!({"extra": 1}));
    }

    #[test]
    fn test_one_of_defaults_follow_matching_branch() {
        let s = json!({
            "type": "object",
            "oneOf": [
                {"properties": {"kind": {"enum": ["a"]}, "a": {"type": "string", "default": "A"}}},
                {"properties": {"kind": {"enum": ["b"]}, "b": {"type": "string", "default": "B"}}}
            ]
        });
        assert_eq!(state(s.clone(), json!({"kind": "b"})), json!({"kind": "b", "b": "B"}));
        assert_eq!(state(s, json!({"kind": "a"})), json!({"kind": "a", "a": "A"}));
    }

    #[test]
    fn test_dependency_defaults() {
        let result = state(
            json!({
                "type": "object",
                "properties": {"card": {"type": "string"}},
                "dependencies": {
                    "card": {"properties": {"billing": {"type": "string", "default": "home"}}}
                }
            }),
            json!({"card": "1234"}),
        );
        assert_eq!(result, json!({"card": "1234", "billing": "home"}));
    }

    #[test]
    fn test_recursive_reference_terminates() {
        let result = state(
            json!({
                "definitions": {
                    "node": {
                        "type": "object",
                        "properties": {
                            "label": {"type": "string", "default": "n"},
                            "child": {"$ref": "#/definitions/node"}
                        }
                    }
                },
                "$ref": "#/definitions/node"
            }),
            Value::Null,
        );
        assert_eq!(result, json!({"label": "n"}));
    }

    #[test]
    fn test_depth_exceeded() {
        let s = schema(json!({
            "type": "object",
            "properties": {"a": {"type": "object", "properties": {"b": {"type": "object"}}}}
        }));
        let definitions = Definitions::empty();
        let err = DefaultMerger::new(&definitions)
            .max_depth(1)
            .default_form_state(&s, &Value::Null)
            .unwrap_err();
        assert_eq!(err.code().code(), "FORM_SCHEMA_DEPTH_EXCEEDED");
    }

    #[test]
    fn test_idempotent() {
        let s = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "default": "x"},
                "tags": {"type": "array", "minItems": 1, "items": {"type": "string", "default": "t"}},
                "nested": {"type": "object", "properties": {"n": {"type": "number", "default": 1}}}
            }
        });
        let once = state(s.clone(), json!({"extra": true}));
        let twice = state(s, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_min_items_above_padding_limit() {
        let s = schema(json!({"type": "array", "minItems": 4_000_000_000u64, "items": {"type": "string"}}));
        let definitions = Definitions::empty();
        let err = get_default_form_state(&s, &Value::Null, &definitions, false).unwrap_err();
        assert_eq!(err.code(), crate::schema::SchemaErrorCode::FormSchemaItemLimitExceeded);

        let small = schema(json!({"type": "array", "minItems": 3, "items": {"type": "number", "default": 0}}));
        let merger = DefaultMerger::new(&definitions).max_padded_items(3);
        assert_eq!(merger.default_form_state(&small, &Value::Null).unwrap(), json!([0, 0, 0]));
        assert!(merger.max_padded_items(2).default_form_state(&small, &Value::Null).is_err());
        // data already long enough needs no padding
        let filled = DefaultMerger::new(&definitions)
            .max_padded_items(2)
            .default_form_state(&small, &json!([1, 2, 3]))
            .unwrap();
        assert_eq!(filled, json!([1, 2, 3]));
    }

    #[test]
    fn test_default_enabling_dependency_settles() {
        let s = json!({
            "properties": {"a": {"default": "x"}},
            "dependencies": {"a": {"properties": {"b": {"default": "y"}}}}
        });
        let once = state(s.clone(), Value::Null);
        assert_eq!(once, json!({"a": "x", "b": "y"}));
        assert_eq!(state(s, once.clone()), once);
    }

    #[test]
    fn test_compute_defaults_without_data() {
        let s = schema(json!({"type": "string", "default": "x"}));
        let definitions = Definitions::empty();
        let computed = compute_defaults(&s, None, &definitions, &Value::Null, false).unwrap();
        assert_eq!(computed, Some(json!("x")));
        let untyped = schema(json!({"type": "string"}));
        assert_eq!(compute_defaults(&untyped, None, &definitions, &Value::Null, false).unwrap(), None);
    }
}
