//! Widget lookup
//!
//! Widgets are referred to by name. A name is either registered directly
//! (a widget component or an alias for another name) or is one of the
//! short names a schema type accepts, e.g. `textarea` for strings.

use indexmap::IndexMap;

use super::errors::{UiError, UiResult};
use crate::schema::utils::get_schema_type;
use crate::schema::{Schema, SchemaType};

/// Alias hops followed before giving up
const MAX_ALIAS_HOPS: usize = 16;

const DEFAULT_WIDGETS: &[&str] = &[
    "AltDateTimeWidget",
    "AltDateWidget",
    "CheckboxesWidget",
    "CheckboxWidget",
    "ColorWidget",
    "DateTimeWidget",
    "DateWidget",
    "EmailWidget",
    "FileWidget",
    "HiddenWidget",
    "PasswordWidget",
    "RadioWidget",
    "RangeWidget",
    "SelectWidget",
    "TextareaWidget",
    "TextWidget",
    "UpDownWidget",
    "URLWidget",
];

fn type_widgets(schema_type: SchemaType) -> &'static [(&'static str, &'static str)] {
    match schema_type {
        SchemaType::Boolean => &[
            ("checkbox", "CheckboxWidget"),
            ("radio", "RadioWidget"),
            ("select", "SelectWidget"),
            ("hidden", "HiddenWidget"),
        ],
        SchemaType::String => &[
            ("text", "TextWidget"),
            ("password", "PasswordWidget"),
            ("email", "EmailWidget"),
            ("hostname", "TextWidget"),
            ("ipv4", "TextWidget"),
            ("ipv6", "TextWidget"),
            ("uri", "URLWidget"),
            ("data-url", "FileWidget"),
            ("radio", "RadioWidget"),
            ("select", "SelectWidget"),
            ("textarea", "TextareaWidget"),
            ("hidden", "HiddenWidget"),
            ("date", "DateWidget"),
            ("datetime", "DateTimeWidget"),
            ("date-time", "DateTimeWidget"),
            ("alt-date", "AltDateWidget"),
            ("alt-datetime", "AltDateTimeWidget"),
            ("color", "ColorWidget"),
            ("file", "FileWidget"),
        ],
        SchemaType::Number | SchemaType::Integer => &[
            ("text", "TextWidget"),
            ("select", "SelectWidget"),
            ("updown", "UpDownWidget"),
            ("range", "RangeWidget"),
            ("radio", "RadioWidget"),
            ("hidden", "HiddenWidget"),
        ],
        SchemaType::Array => &[
            ("select", "SelectWidget"),
            ("checkboxes", "CheckboxesWidget"),
            ("files", "FileWidget"),
            ("hidden", "HiddenWidget"),
        ],
        SchemaType::Object | SchemaType::Null => &[],
    }
}

/// Registered widget names
#[derive(Debug, Clone)]
pub struct WidgetRegistry {
    /// Name to target; a name that targets itself is a widget component
    widgets: IndexMap<String, String>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self {
            widgets: DEFAULT_WIDGETS
                .iter()
                .map(|name| (name.to_string(), name.to_string()))
                .collect(),
        }
    }
}

impl WidgetRegistry {
    /// A registry holding the default widget components
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with no widgets at all
    pub fn empty() -> Self {
        Self {
            widgets: IndexMap::new(),
        }
    }

    /// Registers a widget component
    pub fn register(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.widgets.insert(name.clone(), name);
        self
    }

    /// Registers `name` as another name for `target`
    pub fn alias(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.widgets.insert(name.into(), target.into());
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.widgets.contains_key(name)
    }

    /// Resolves `widget` to a registered component for `schema`.
    ///
    /// # Errors
    ///
    /// - The schema has no type that takes widgets
    /// - The type does not accept the widget name
    /// - The short name maps to a component that is not registered
    pub fn get_widget(&self, schema: &Schema, widget: &str) -> UiResult<String> {
        let mut name = widget;
        for _ in 0..MAX_ALIAS_HOPS {
            match self.widgets.get(name) {
                Some(target) if target == name => return Ok(target.clone()),
                Some(target) => name = target,
                None => return self.type_widget(schema, name),
            }
        }
        Err(UiError::UnresolvedAlias(widget.to_string()))
    }

    /// Returns whether `widget` resolves for `schema`
    pub fn has_widget(&self, schema: &Schema, widget: &str) -> bool {
        self.get_widget(schema, widget).is_ok()
    }

    fn type_widget(&self, schema: &Schema, widget: &str) -> UiResult<String> {
        let schema_type = get_schema_type(schema);
        let type_name = schema_type.map_or("undefined", |t| t.type_name());
        let widgets = schema_type.map(type_widgets).unwrap_or_default();
        if widgets.is_empty() {
            return Err(UiError::NoWidgetForType {
                schema_type: type_name.to_string(),
            });
        }

        let no_widget = || UiError::NoWidget {
            widget: widget.to_string(),
            schema_type: type_name.to_string(),
        };
        let component = widgets
            .iter()
            .find(|(short, _)| *short == widget)
            .map(|(_, component)| *component)
            .ok_or_else(no_widget)?;
        match self.widgets.get(component) {
            Some(target) if target == component => Ok(target.clone()),
            _ => Err(no_widget()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    #[test]
    fn test_short_names_per_type() {
        let widgets = WidgetRegistry::new();
        let string = schema(json!({"type": "string"}));
        assert_eq!(widgets.get_widget(&string, "textarea").unwrap(), "TextareaWidget");
        assert_eq!(widgets.get_widget(&string, "data-url").unwrap(), "FileWidget");

        let number = schema(json!({"type": "integer"}));
        assert_eq!(widgets.get_widget(&number, "updown").unwrap(), "UpDownWidget");
        assert!(matches!(
            widgets.get_widget(&number, "textarea"),
            Err(UiError::NoWidget { .. })
        ));
    }

    #[test]
    fn test_component_names_resolve_directly() {
        let widgets = WidgetRegistry::new();
        let number = schema(json!({"type": "number"}));
        assert_eq!(widgets.get_widget(&number, "TextareaWidget").unwrap(), "TextareaWidget");
    }

    #[test]
    fn test_aliases() {
        let widgets = WidgetRegistry::new()
            .register("StarRating")
            .alias("stars", "StarRating")
            .alias("rating", "stars");
        let number = schema(json!({"type": "number"}));
        assert_eq!(widgets.get_widget(&number, "rating").unwrap(), "StarRating");
        assert!(widgets.has_widget(&number, "stars"));

        let looping = WidgetRegistry::new().alias("a", "b").alias("b", "a");
        assert!(matches!(
            looping.get_widget(&number, "a"),
            Err(UiError::UnresolvedAlias(_))
        ));
    }

    #[test]
    fn test_untyped_schema_has_no_widgets() {
        let widgets = WidgetRegistry::new();
        let untyped = schema(json!({}));
        assert!(matches!(
            widgets.get_widget(&untyped, "text"),
            Err(UiError::NoWidgetForType { .. })
        ));
        let object = schema(json!({"type": "object"}));
        assert!(!widgets.has_widget(&object, "text"));
    }

    #[test]
    fn test_unregistered_component() {
        let widgets = WidgetRegistry::empty();
        let string = schema(json!({"type": "string"}));
        assert!(!widgets.has_widget(&string, "text"));
        assert!(!widgets.is_registered("TextWidget"));
    }
}
