//! Form state
//!
//! A [`FormState`] bundles everything derived from a schema and its data:
//! the default-merged data, the retrieved schema, both mirror trees and the
//! latest validation outcome. States are immutable; a change produces a new
//! state.

use serde::Serialize;
use serde_json::{Map, Value};

use super::defaults::DefaultMerger;
use super::errors::{FormError, FormResult};
use super::mirror::{IdSchema, MirrorBuilder, PathSchema};
use crate::config::FormConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{Definitions, Schema, SchemaResolver};
use crate::ui::UiSchema;
use crate::validation::{validate_form_data, ErrorSchema, ValidateOptions, ValidationError};

/// Derived state of one form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub schema: Schema,
    pub ui_schema: UiSchema,
    pub retrieved_schema: Schema,
    pub form_data: Value,
    pub id_schema: IdSchema,
    pub path_schema: PathSchema,
    pub errors: Vec<ValidationError>,
    pub error_schema: ErrorSchema,
    #[serde(skip)]
    config: FormConfig,
}

impl FormState {
    /// Builds the state for `schema` and `form_data`.
    ///
    /// Validation runs only when `options` is given.
    pub fn from_props(
        schema: Schema,
        ui_schema: UiSchema,
        form_data: Value,
        config: &FormConfig,
        options: Option<&ValidateOptions>,
    ) -> FormResult<Self> {
        let definitions = Definitions::from_root(&schema)?;

        let form_data = DefaultMerger::new(&definitions)
            .include_undefined(config.include_undefined_values)
            .max_depth(config.max_depth)
            .max_padded_items(config.max_padded_items)
            .default_form_state(&schema, &form_data)?;
        let retrieved_schema = SchemaResolver::new(&definitions).retrieve(&schema, &form_data)?;

        let mirrors = MirrorBuilder::new(&definitions).max_depth(config.max_depth);
        let id_schema = mirrors.id_schema(
            &retrieved_schema,
            ui_schema.root_field_id.as_deref(),
            &form_data,
            &config.id_prefix,
        )?;
        let path_schema = mirrors.path_schema(&retrieved_schema, "", &form_data)?;

        let (errors, error_schema) = match options {
            Some(options) => {
                let report = validate_form_data(&form_data, &schema, options)?;
                (report.errors, report.error_schema)
            }
            None => (Vec::new(), ErrorSchema::default()),
        };

        Ok(Self {
            schema,
            ui_schema,
            retrieved_schema,
            form_data,
            id_schema,
            path_schema,
            errors,
            error_schema,
            config: config.clone(),
        })
    }

    /// Replaces the data at `path` with `value` and rebuilds the state.
    ///
    /// Missing objects along the path are created. An array index may
    /// address an existing element or append one past the end.
    pub fn change<S: AsRef<str>>(
        &self,
        path: &[S],
        value: Value,
        options: Option<&ValidateOptions>,
    ) -> FormResult<Self> {
        let path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
        let mut form_data = self.form_data.clone();
        set_at_path(&mut form_data, &path, value)?;

        let joined = path.join(".");
        log_event_with_fields(Event::FormStateChanged, &[("path", joined.as_str())]);

        Self::from_props(
            self.schema.clone(),
            self.ui_schema.clone(),
            form_data,
            &self.config,
            options,
        )
    }

    /// The data reduced to the fields the schema describes
    pub fn omit_extra_data(&self) -> Value {
        used_data(&self.form_data, &self.path_schema)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }
}

fn used_data(data: &Value, node: &PathSchema) -> Value {
    if node.is_leaf() || node.leaf().additional_properties {
        return data.clone();
    }
    match data {
        Value::Object(entries) => Value::Object(
            entries
                .iter()
                .filter_map(|(key, value)| Some((key.clone(), used_data(value, node.child(key)?))))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| Some(used_data(item, node.child(&index.to_string())?)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn set_at_path(target: &mut Value, path: &[String], value: Value) -> FormResult<()> {
    let Some((last, parents)) = path.split_last() else {
        *target = value;
        return Ok(());
    };

    let mut node = target;
    for segment in parents {
        node = slot(node, segment, path)?;
    }
    *slot(node, last, path)? = value;
    Ok(())
}

/// The value under `segment`, created as `null` when missing
fn slot<'v>(node: &'v mut Value, segment: &str, path: &[String]) -> FormResult<&'v mut Value> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(entries) => Ok(entries.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index: usize = segment
                .parse()
                .map_err(|_| FormError::invalid_path(path, format!("'{}' is not an array index", segment)))?;
            if index == items.len() {
                items.push(Value::Null);
            }
            let len = items.len();
            items
                .get_mut(index)
                .ok_or_else(|| FormError::invalid_path(path, format!("index {} is past the end ({})", index, len)))
        }
        _ => Err(FormError::invalid_path(path, format!("'{}' is below a non-container value", segment))),
    }
}
