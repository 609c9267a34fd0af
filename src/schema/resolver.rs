//! Schema resolution
//!
//! Turns a schema node into the effective schema for a data value:
//! - `$ref` is replaced by its definition, sibling keywords overriding it
//! - `dependencies` whose trigger property is present are applied
//! - `allOf` parts are merged into the node
//! - data keys not declared in `properties` get stub property schemas when
//!   `additionalProperties` allows them
//!
//! [`SchemaResolver::resolve`] additionally replaces `oneOf`/`anyOf` with the
//! branch matching the data, yielding a combinator-free schema.
//!
//! Resolution is a pure function of its inputs.

use indexmap::IndexMap;
use serde_json::Value;

use super::definitions::Definitions;
use super::errors::{SchemaError, SchemaResult};
use super::matching::get_matching_option;
use super::merge::{merge_all_of, merge_schemas, overlay};
use super::types::{Dependency, Schema, SchemaOrBool, SchemaType, TypeSet, ADDITIONAL_PROPERTY_FLAG};
use super::utils::guess_type;
use crate::observability::{log_event_with_fields, trace_event, Event};
use crate::validation::is_valid;

/// Upper bound on nested combinator selection within one node
const MAX_COMBINATOR_DEPTH: usize = 32;

/// Resolves schemas against a definitions table
pub struct SchemaResolver<'a> {
    definitions: &'a Definitions,
}

impl<'a> SchemaResolver<'a> {
    /// Creates a resolver backed by the given definitions
    pub fn new(definitions: &'a Definitions) -> Self {
        Self { definitions }
    }

    /// Returns the definitions table
    pub fn definitions(&self) -> &'a Definitions {
        self.definitions
    }

    /// Retrieves the effective schema for `data`. `oneOf`/`anyOf` are kept.
    ///
    /// # Errors
    ///
    /// - Unknown or non-local references
    /// - A reference chain that revisits a reference (fatal)
    pub fn retrieve(&self, schema: &Schema, data: &Value) -> SchemaResult<Schema> {
        let mut chain = Vec::new();
        self.retrieve_with(schema, data, &mut chain)
    }

    /// Retrieves the effective schema and replaces `oneOf`/`anyOf` by the
    /// branch that matches `data`.
    pub fn resolve(&self, schema: &Schema, data: &Value) -> SchemaResult<Schema> {
        let mut resolved = self.retrieve(schema, data)?;
        for _ in 0..MAX_COMBINATOR_DEPTH {
            if resolved.combinator_options().is_none() {
                trace_event(Event::SchemaResolved, &[]);
                return Ok(resolved);
            }
            resolved = self.resolve_combinator(&resolved, data)?;
        }
        Err(SchemaError::depth_exceeded(MAX_COMBINATOR_DEPTH))
    }

    /// Replaces the node's `oneOf` (or else `anyOf`) by the matching branch,
    /// merged onto the rest of the node.
    pub fn resolve_combinator(&self, schema: &Schema, data: &Value) -> SchemaResult<Schema> {
        let Some(options) = schema.combinator_options() else {
            return Ok(schema.clone());
        };
        let selected = get_matching_option(data, options, self.definitions);
        let branch = self.retrieve(&options[selected.index], data)?;

        let mut remainder = schema.clone();
        if remainder.one_of.as_ref().map_or(false, |o| !o.is_empty()) {
            remainder.one_of = None;
        } else {
            remainder.any_of = None;
        }

        let merged = merge_schemas(&remainder, &branch)?;
        self.retrieve(&merged, data)
    }

    fn retrieve_with(&self, schema: &Schema, data: &Value, chain: &mut Vec<String>) -> SchemaResult<Schema> {
        let mut resolved = self.resolve_node(schema, data, chain)?;

        if resolved.all_of.is_some() {
            resolved = match merge_all_of(&resolved) {
                Ok(merged) => merged,
                Err(e) => {
                    log_event_with_fields(Event::AllOfMergeFailed, &[("reason", e.message())]);
                    resolved.all_of = None;
                    resolved
                }
            };
        }

        let stubs_additional = matches!(&resolved.additional_properties, Some(ap) if ap.allows());
        if stubs_additional {
            resolved = self.stub_existing_additional_properties(&resolved, data, chain)?;
        }

        Ok(resolved)
    }

    fn resolve_node(&self, schema: &Schema, data: &Value, chain: &mut Vec<String>) -> SchemaResult<Schema> {
        if let Some(reference) = &schema.reference {
            return self.resolve_reference(schema, reference, data, chain);
        }
        if schema.dependencies.is_some() {
            let resolved = self.resolve_dependencies(schema, data, chain)?;
            return self.retrieve_with(&resolved, data, chain);
        }
        if let Some(parts) = &schema.all_of {
            let mut resolved = schema.clone();
            resolved.all_of = Some(
                parts
                    .iter()
                    .map(|part| self.retrieve_with(part, data, chain))
                    .collect::<SchemaResult<Vec<_>>>()?,
            );
            return Ok(resolved);
        }
        Ok(schema.clone())
    }

    fn resolve_reference(
        &self,
        schema: &Schema,
        reference: &str,
        data: &Value,
        chain: &mut Vec<String>,
    ) -> SchemaResult<Schema> {
        if chain.iter().any(|r| r == reference) {
            return Err(SchemaError::cyclic_reference(reference));
        }

        let target = self.definitions.find(reference)?;
        let mut local = schema.clone();
        local.reference = None;
        let merged = overlay(&target, &local)?;
        trace_event(Event::ReferenceResolved, &[("reference", reference)]);

        chain.push(reference.to_string());
        let resolved = self.retrieve_with(&merged, data, chain);
        chain.pop();
        resolved
    }

    /// Applies the node's `dependencies` whose trigger property is present
    /// in `data`, in declaration order.
    fn resolve_dependencies(&self, schema: &Schema, data: &Value, chain: &mut Vec<String>) -> SchemaResult<Schema> {
        let mut resolved = schema.clone();
        let dependencies = resolved.dependencies.take().unwrap_or_default();
        if resolved.combinator_options().is_some() {
            resolved = self.resolve_combinator(&resolved, data)?;
        }

        for (key, dependency) in &dependencies {
            if data.get(key).is_none() {
                continue;
            }
            if resolved.properties.is_some() && resolved.property(key).is_none() {
                continue;
            }
            resolved = match dependency {
                Dependency::Properties(names) => with_dependent_properties(resolved, names),
                Dependency::Schema(dependent) => {
                    self.with_dependent_schema(resolved, data, key, dependent, chain)?
                }
            };
        }

        Ok(resolved)
    }

    fn with_dependent_schema(
        &self,
        schema: Schema,
        data: &Value,
        key: &str,
        dependent: &Schema,
        chain: &mut Vec<String>,
    ) -> SchemaResult<Schema> {
        let mut dependent = self.retrieve_with(dependent, data, chain)?;
        let one_of = dependent.one_of.take();
        let merged = merge_schemas(&schema, &dependent)?;

        let Some(one_of) = one_of else {
            return Ok(merged);
        };
        let one_of = one_of
            .iter()
            .map(|sub| match &sub.reference {
                Some(reference) => self.resolve_reference(sub, reference, data, chain),
                None => Ok(sub.clone()),
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        self.with_exactly_one_subschema(merged, data, key, &one_of, chain)
    }

    /// Merges in the single `oneOf` subschema whose constraint on the
    /// trigger property accepts the data. Zero or several candidates leave
    /// the schema unchanged.
    fn with_exactly_one_subschema(
        &self,
        schema: Schema,
        data: &Value,
        key: &str,
        one_of: &[Schema],
        chain: &mut Vec<String>,
    ) -> SchemaResult<Schema> {
        let valid: Vec<&Schema> = one_of
            .iter()
            .filter(|sub| {
                sub.property(key).map_or(false, |condition| {
                    let mut properties = IndexMap::new();
                    properties.insert(key.to_string(), condition.clone());
                    let condition_schema = Schema {
                        schema_type: Some(TypeSet::Single(SchemaType::Object)),
                        properties: Some(properties),
                        ..Default::default()
                    };
                    is_valid(&condition_schema, data, self.definitions)
                })
            })
            .collect();

        if valid.len() != 1 {
            let count = valid.len().to_string();
            log_event_with_fields(
                Event::DependencyOneOfIgnored,
                &[("dependency", key), ("valid_subschemas", count.as_str())],
            );
            return Ok(schema);
        }

        let mut dependent = valid[0].clone();
        if let Some(properties) = dependent.properties.as_mut() {
            properties.shift_remove(key);
        }
        let dependent = self.retrieve_with(&dependent, data, chain)?;
        merge_schemas(&schema, &dependent)
    }

    /// Adds a property schema for every key of `data` the schema does not
    /// declare, flagged with [`ADDITIONAL_PROPERTY_FLAG`].
    fn stub_existing_additional_properties(
        &self,
        schema: &Schema,
        data: &Value,
        chain: &mut Vec<String>,
    ) -> SchemaResult<Schema> {
        let Some(object) = data.as_object() else {
            return Ok(schema.clone());
        };

        let mut stubbed = schema.clone();
        let properties = stubbed.properties.get_or_insert_with(IndexMap::new);
        for (key, value) in object {
            if properties.contains_key(key) {
                continue;
            }
            let additional = schema.additional_properties.as_ref().and_then(SchemaOrBool::schema);
            let mut stub = match additional {
                Some(Schema { reference: Some(reference), .. }) => {
                    self.retrieve_with(&Schema::from_ref(reference.as_str()), value, chain)?
                }
                Some(additional) if additional.schema_type.is_some() => additional.clone(),
                _ => Schema::typed(guess_type(value)),
            };
            stub.extra
                .insert(ADDITIONAL_PROPERTY_FLAG.to_string(), Value::Bool(true));
            properties.insert(key.clone(), stub);
        }

        Ok(stubbed)
    }
}

fn with_dependent_properties(mut schema: Schema, names: &[String]) -> Schema {
    for name in names {
        if !schema.required.contains(name) {
            schema.required.push(name.clone());
        }
    }
    schema
}

/// Retrieves the effective schema of `schema` for `data`
pub fn retrieve_schema(schema: &Schema, definitions: &Definitions, data: &Value) -> SchemaResult<Schema> {
    SchemaResolver::new(definitions).retrieve(schema, data)
}

/// Resolves `schema` for `data` into a concrete, combinator-free schema
pub fn resolve_schema(schema: &Schema, definitions: &Definitions, data: &Value) -> SchemaResult<Schema> {
    SchemaResolver::new(definitions).resolve(schema, data)
}
