//! `oneOf` / `anyOf` branch selection

use indexmap::IndexMap;
use serde_json::Value;

use super::definitions::Definitions;
use super::types::Schema;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::utils::guess_type;
use crate::validation::is_valid;

/// Outcome of branch selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionMatch {
    /// Index of the selected option
    pub index: usize,
    /// False when no option accepted the data and the first was used
    pub matched: bool,
}

/// Selects the first option, in declaration order, that accepts `data`.
///
/// An option that declares `properties` only matches data carrying at least
/// one of those properties, and its own `required` list is ignored so that
/// partially filled data still selects it.
pub fn get_matching_option(data: &Value, options: &[Schema], definitions: &Definitions) -> OptionMatch {
    for (index, option) in options.iter().enumerate() {
        let candidate = match &option.properties {
            Some(properties) => augment_with_property_presence(option, properties),
            None => option.clone(),
        };
        if is_valid(&candidate, data, definitions) {
            return OptionMatch { index, matched: true };
        }
    }

    if !data.is_null() && !options.is_empty() {
        let count = options.len().to_string();
        log_event_with_fields(
            Event::NoMatchingOption,
            &[("data_type", guess_type(data).type_name()), ("options", count.as_str())],
        );
    }
    OptionMatch { index: 0, matched: false }
}

fn augment_with_property_presence(option: &Schema, properties: &IndexMap<String, Schema>) -> Schema {
    let requires_any = Schema {
        any_of: Some(
            properties
                .keys()
                .map(|key| Schema {
                    required: vec![key.clone()],
                    ..Default::default()
                })
                .collect(),
        ),
        ..Default::default()
    };

    let mut augmented = option.clone();
    augmented.required.clear();
    if augmented.any_of.is_some() {
        augmented.all_of.get_or_insert_with(Vec::new).push(requires_any);
    } else {
        augmented.any_of = requires_any.any_of;
    }
    augmented
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Vec<Schema> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_discriminant_selects_second_branch() {
        let opts = options(json!([
            {"properties": {"kind": {"const": "a"}, "x": {"type": "string"}}, "required": ["kind", "x"]},
            {"properties": {"kind": {"const": "b"}, "y": {"type": "number"}}, "required": ["kind", "y"]}
        ]));
        let m = get_matching_option(&json!({"kind": "b"}), &opts, &Definitions::empty());
        assert_eq!(m, OptionMatch { index: 1, matched: true });
    }

    #[test]
    fn test_first_match_wins_on_ties() {
        let opts = options(json!([
            {"properties": {"name": {"type": "string"}}},
            {"properties": {"name": {"type": "string"}, "age": {"type": "number"}}}
        ]));
        let m = get_matching_option(&json!({"name": "x"}), &opts, &Definitions::empty());
        assert_eq!(m.index, 0);
        assert!(m.matched);
    }

    #[test]
    fn test_no_match_defaults_to_first() {
        let opts = options(json!([{"type": "string"}, {"type": "number"}]));
        let m = get_matching_option(&json!(true), &opts, &Definitions::empty());
        assert_eq!(m, OptionMatch { index: 0, matched: false });
    }

    #[test]
    fn test_primitive_options() {
        let opts = options(json!([{"type": "string"}, {"type": "number"}]));
        let m = get_matching_option(&json!(4), &opts, &Definitions::empty());
        assert_eq!(m.index, 1);
    }

    #[test]
    fn test_option_with_own_any_of() {
        let opts = options(json!([
            {"properties": {"a": {"type": "string"}}, "anyOf": [{"required": ["zzz"]}]},
            {"properties": {"a": {"type": "string"}}}
        ]));
        let m = get_matching_option(&json!({"a": "v"}), &opts, &Definitions::empty());
        assert_eq!(m.index, 1);
    }
}
