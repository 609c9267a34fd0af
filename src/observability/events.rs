//! Observable events for formschema
//!
//! Every log line emitted by the resolver, the default merger and the
//! validation adapter names one of these events.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Resolution
    /// A `$ref` was substituted by its definition
    ReferenceResolved,
    /// A schema was fully retrieved for a data value
    SchemaResolved,
    /// No `oneOf`/`anyOf` branch matched the data; the first branch is used
    NoMatchingOption,
    /// A dependency `oneOf` did not have exactly one valid subschema
    DependencyOneOfIgnored,
    /// `allOf` subschemas could not be merged; `allOf` was dropped
    AllOfMergeFailed,

    // Form state
    /// Default form state computed
    DefaultsComputed,
    /// A subtree of the form data was replaced
    FormStateChanged,

    // Validation
    /// A schema used a format nobody registered
    UnknownFormat,
    /// Validation pass complete
    ValidationComplete,
    /// Validation aborted on a structurally invalid schema
    ValidationFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ReferenceResolved => "REFERENCE_RESOLVED",
            Event::SchemaResolved => "SCHEMA_RESOLVED",
            Event::NoMatchingOption => "NO_MATCHING_OPTION",
            Event::DependencyOneOfIgnored => "DEPENDENCY_ONEOF_IGNORED",
            Event::AllOfMergeFailed => "ALLOF_MERGE_FAILED",

            Event::DefaultsComputed => "DEFAULTS_COMPUTED",
            Event::FormStateChanged => "FORM_STATE_CHANGED",

            Event::UnknownFormat => "UNKNOWN_FORMAT",
            Event::ValidationComplete => "VALIDATION_COMPLETE",
            Event::ValidationFailed => "VALIDATION_FAILED",
        }
    }

    /// Returns true if this event reports a degraded result the caller
    /// should know about
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::NoMatchingOption
                | Event::DependencyOneOfIgnored
                | Event::AllOfMergeFailed
                | Event::UnknownFormat
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::ReferenceResolved,
            Event::SchemaResolved,
            Event::NoMatchingOption,
            Event::DependencyOneOfIgnored,
            Event::AllOfMergeFailed,
            Event::DefaultsComputed,
            Event::FormStateChanged,
            Event::UnknownFormat,
            Event::ValidationComplete,
            Event::ValidationFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert_eq!(s, s.to_uppercase());
        }
    }

    #[test]
    fn test_warning_events() {
        assert!(Event::NoMatchingOption.is_warning());
        assert!(Event::AllOfMergeFailed.is_warning());
        assert!(!Event::ValidationComplete.is_warning());
    }
}
