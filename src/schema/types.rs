//! Schema type definitions
//!
//! A typed JSON Schema (draft 6 subset). Recognised keywords are explicit
//! fields; any other key is kept verbatim in [`Schema::extra`] so that
//! annotations such as `enumNames` survive a round trip.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::errors::SchemaResult;

/// Marker set on property schemas synthesised from `additionalProperties`
pub const ADDITIONAL_PROPERTY_FLAG: &str = "__additional_property";

/// Primitive type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl SchemaType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Null => "null",
        }
    }

    /// Returns whether `value` is an instance of this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Integer => match value.as_f64() {
                Some(n) if value.is_f64() => n.fract() == 0.0,
                Some(_) => true,
                None => false,
            },
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Object => value.is_object(),
            SchemaType::Array => value.is_array(),
            SchemaType::Null => value.is_null(),
        }
    }
}

/// The `type` keyword: one type or a list of alternatives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

impl TypeSet {
    /// Iterates the declared types
    pub fn iter(&self) -> impl Iterator<Item = &SchemaType> {
        match self {
            TypeSet::Single(t) => std::slice::from_ref(t).iter(),
            TypeSet::Multiple(ts) => ts.iter(),
        }
    }

    /// Returns whether `schema_type` is declared
    pub fn contains(&self, schema_type: SchemaType) -> bool {
        self.iter().any(|t| *t == schema_type)
    }

    /// Returns whether any declared type accepts `value`
    pub fn accepts(&self, value: &Value) -> bool {
        self.iter().any(|t| t.matches(value))
    }

    /// Returns the declared types joined with commas
    pub fn names(&self) -> String {
        self.iter()
            .map(SchemaType::type_name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// The `items` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    /// Fixed-position item schemas
    Tuple(Vec<Schema>),
    /// One schema for every element
    Single(Box<Schema>),
}

/// Keywords that take either a boolean or a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrBool {
    Bool(bool),
    Schema(Box<Schema>),
}

impl SchemaOrBool {
    /// Returns false only for the literal `false`
    pub fn allows(&self) -> bool {
        !matches!(self, SchemaOrBool::Bool(false))
    }

    /// Returns the schema form if present
    pub fn schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrBool::Schema(schema) => Some(schema),
            SchemaOrBool::Bool(_) => None,
        }
    }
}

/// An entry of the `dependencies` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    /// Properties that become required
    Properties(Vec<String>),
    /// Schema merged in when the trigger property is present
    Schema(Box<Schema>),
}

/// A schema node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared default; `null` is a legitimate default
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    #[serde(
        rename = "const",
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub constant: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    // Objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<SchemaOrBool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<IndexMap<String, Dependency>>,

    // Arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<SchemaOrBool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<Box<Schema>>,

    // Strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    // Numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    // Combinators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<IndexMap<String, Schema>>,

    /// Unrecognised keywords, kept as opaque data
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Distinguishes a present `null` from an absent key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Schema {
    /// Creates a schema with only a type
    pub fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(TypeSet::Single(schema_type)),
            ..Default::default()
        }
    }

    /// Creates a `$ref` schema
    pub fn from_ref(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    /// Parses a schema from JSON
    pub fn from_value(value: Value) -> SchemaResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialises the schema back to JSON
    pub fn to_value(&self) -> SchemaResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Returns the `oneOf` or `anyOf` options, `oneOf` first
    pub fn combinator_options(&self) -> Option<&[Schema]> {
        fn non_empty(options: &Option<Vec<Schema>>) -> Option<&[Schema]> {
            options.as_deref().filter(|o| !o.is_empty())
        }
        non_empty(&self.one_of).or_else(|| non_empty(&self.any_of))
    }

    /// Returns whether the node still needs reference, dependency or
    /// `allOf` resolution
    pub fn needs_retrieval(&self) -> bool {
        self.reference.is_some() || self.dependencies.is_some() || self.all_of.is_some()
    }

    /// Returns the schema for a property, if declared
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Returns the item schema that applies at `index`
    pub fn item_schema(&self, index: usize) -> Option<&Schema> {
        match &self.items {
            Some(Items::Single(item)) => Some(item),
            Some(Items::Tuple(items)) => items
                .get(index)
                .or_else(|| self.additional_items.as_ref().and_then(SchemaOrBool::schema)),
            None => None,
        }
    }

    /// Returns whether the schema was synthesised for an additional property
    pub fn is_additional_property(&self) -> bool {
        self.extra.get(ADDITIONAL_PROPERTY_FLAG) == Some(&Value::Bool(true))
    }

    /// Returns whether the schema permits properties it does not declare
    pub fn allows_additional_properties(&self) -> bool {
        self.additional_properties
            .as_ref()
            .map_or(true, SchemaOrBool::allows)
    }
}
