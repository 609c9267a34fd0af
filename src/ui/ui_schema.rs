//! UI hints
//!
//! A uiSchema mirrors the data shape. Keys starting with `ui:` are hints
//! for the node itself; every other object-valued key holds the hints of
//! the property of that name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::UiError;

const UI_PREFIX: &str = "ui:";

/// The `ui:widget` hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiWidget {
    /// A widget name, e.g. `"textarea"`
    Name(String),
    /// Older object form carrying its own options
    Detailed {
        component: String,
        #[serde(default)]
        options: Map<String, Value>,
    },
}

impl UiWidget {
    pub fn name(&self) -> &str {
        match self {
            UiWidget::Name(name) => name,
            UiWidget::Detailed { component, .. } => component,
        }
    }
}

/// UI hints for one node and its properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUiSchema", into = "RawUiSchema")]
pub struct UiSchema {
    pub widget: Option<UiWidget>,
    pub field: Option<String>,
    pub options: Map<String, Value>,
    pub order: Option<Vec<String>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub help: Option<String>,
    pub placeholder: Option<String>,
    pub disabled: Option<bool>,
    pub readonly: Option<bool>,
    pub autofocus: Option<bool>,
    pub class_names: Option<String>,
    pub empty_value: Option<Value>,
    pub root_field_id: Option<String>,
    /// Keys this type does not interpret, kept verbatim
    pub extra: IndexMap<String, Value>,
    children: IndexMap<String, UiSchema>,
}

impl UiSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses hints from JSON; `null` means no hints
    pub fn from_value(value: Value) -> Result<Self, UiError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| UiError::InvalidUiSchema(e.to_string()))
    }

    /// Hints for the property `name`
    pub fn child(&self, name: &str) -> Option<&UiSchema> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &UiSchema)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn with_child(mut self, name: impl Into<String>, child: UiSchema) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    pub fn with_widget(mut self, widget: impl Into<String>) -> Self {
        self.widget = Some(UiWidget::Name(widget.into()));
        self
    }

    /// Name of the requested widget, if any
    pub fn widget_name(&self) -> Option<&str> {
        self.widget.as_ref().map(UiWidget::name)
    }
}

/// Flattens every `ui:` hint into one options map.
///
/// Scalar hints come first under their name without the prefix, then the
/// options of an object-form `ui:widget`, then `ui:options`, which wins on
/// conflicts.
pub fn get_ui_options(ui: &UiSchema) -> Map<String, Value> {
    let mut options = Map::new();
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            options.insert(key.to_string(), value);
        }
    };

    put("widget", match &ui.widget {
        Some(UiWidget::Name(name)) => Some(Value::String(name.clone())),
        _ => None,
    });
    put("field", ui.field.clone().map(Value::String));
    put("order", ui.order.clone().map(|o| o.into_iter().map(Value::String).collect()));
    put("title", ui.title.clone().map(Value::String));
    put("description", ui.description.clone().map(Value::String));
    put("help", ui.help.clone().map(Value::String));
    put("placeholder", ui.placeholder.clone().map(Value::String));
    put("disabled", ui.disabled.map(Value::Bool));
    put("readonly", ui.readonly.map(Value::Bool));
    put("autofocus", ui.autofocus.map(Value::Bool));
    put("classNames", ui.class_names.clone().map(Value::String));
    put("emptyValue", ui.empty_value.clone());
    put("rootFieldId", ui.root_field_id.clone().map(Value::String));
    for (key, value) in &ui.extra {
        if let Some(name) = key.strip_prefix(UI_PREFIX) {
            put(name, Some(value.clone()));
        }
    }

    if let Some(UiWidget::Detailed { options: widget_options, .. }) = &ui.widget {
        options.extend(widget_options.clone());
    }
    options.extend(ui.options.clone());
    options
}

#[derive(Serialize, Deserialize)]
struct RawUiSchema {
    #[serde(rename = "ui:widget", default, skip_serializing_if = "Option::is_none")]
    widget: Option<UiWidget>,
    #[serde(rename = "ui:field", default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(rename = "ui:options", default, skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
    #[serde(rename = "ui:order", default, skip_serializing_if = "Option::is_none")]
    order: Option<Vec<String>>,
    #[serde(rename = "ui:title", default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "ui:description", default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "ui:help", default, skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(rename = "ui:placeholder", default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(rename = "ui:disabled", default, skip_serializing_if = "Option::is_none")]
    disabled: Option<bool>,
    #[serde(rename = "ui:readonly", default, skip_serializing_if = "Option::is_none")]
    readonly: Option<bool>,
    #[serde(rename = "ui:autofocus", default, skip_serializing_if = "Option::is_none")]
    autofocus: Option<bool>,
    #[serde(rename = "ui:classNames", default, skip_serializing_if = "Option::is_none")]
    class_names: Option<String>,
    #[serde(rename = "ui:emptyValue", default, skip_serializing_if = "Option::is_none")]
    empty_value: Option<Value>,
    #[serde(rename = "ui:rootFieldId", default, skip_serializing_if = "Option::is_none")]
    root_field_id: Option<String>,
    #[serde(flatten)]
    rest: IndexMap<String, Value>,
}

impl TryFrom<RawUiSchema> for UiSchema {
    type Error = UiError;

    fn try_from(raw: RawUiSchema) -> Result<Self, Self::Error> {
        let mut extra = IndexMap::new();
        let mut children = IndexMap::new();
        for (key, value) in raw.rest {
            if !key.starts_with(UI_PREFIX) && value.is_object() {
                let child = serde_json::from_value(value)
                    .map_err(|e| UiError::InvalidUiSchema(format!("{}: {}", key, e)))?;
                children.insert(key, child);
            } else {
                extra.insert(key, value);
            }
        }

        Ok(UiSchema {
            widget: raw.widget,
            field: raw.field,
            options: raw.options,
            order: raw.order,
            title: raw.title,
            description: raw.description,
            help: raw.help,
            placeholder: raw.placeholder,
            disabled: raw.disabled,
            readonly: raw.readonly,
            autofocus: raw.autofocus,
            class_names: raw.class_names,
            empty_value: raw.empty_value,
            root_field_id: raw.root_field_id,
            extra,
            children,
        })
    }
}

impl From<UiSchema> for RawUiSchema {
    fn from(ui: UiSchema) -> Self {
        let mut rest = ui.extra;
        for (key, child) in ui.children {
            rest.insert(key, serde_json::to_value(child).unwrap_or_default());
        }

        RawUiSchema {
            widget: ui.widget,
            field: ui.field,
            options: ui.options,
            order: ui.order,
            title: ui.title,
            description: ui.description,
            help: ui.help,
            placeholder: ui.placeholder,
            disabled: ui.disabled,
            readonly: ui.readonly,
            autofocus: ui.autofocus,
            class_names: ui.class_names,
            empty_value: ui.empty_value,
            root_field_id: ui.root_field_id,
            rest,
        }
    }
}
