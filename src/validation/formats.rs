//! String formats
//!
//! Built-in checks for the formats forms commonly declare, plus custom
//! formats registered by name as regular expressions. A format nobody
//! knows is accepted.

use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use regex::Regex;
use uuid::Uuid;

use super::errors::{ValidateError, ValidateResult};

const EMAIL: &str = r"(?i)^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*$";
const HOSTNAME: &str = r"(?i)^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[-0-9a-z]{0,61}[0-9a-z])?)*\.?$";
const IPV4: &str = r"^(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)$";
const URI: &str = r"(?i)^(?:[a-z][a-z0-9+\-.]*:)(?:/?/)?[^\s]*$";
const URI_REFERENCE: &str = r"(?i)^(?:(?:[a-z][a-z0-9+\-.]*:)?/?/)?(?:[^\\\s#][^\s#]*)?(?:#[^\\\s]*)?$";
const TIME: &str = r"(?i)^(?:[0-2]\d:[0-5]\d:[0-5]\d|23:59:60)(?:\.\d+)?(?:z|[+-]\d\d(?::?\d\d)?)?$";
const JSON_POINTER: &str = r"^(?:/(?:[^~/]|~0|~1)*)*$";
const COLOR: &str = r"^(#?([0-9A-Fa-f]{3}){1,2}\b|aqua|black|blue|fuchsia|gray|green|lime|maroon|navy|olive|orange|purple|red|silver|teal|white|yellow|(rgb\(\s*\b([0-9]|[1-9][0-9]|1[0-9][0-9]|2[0-4][0-9]|25[0-5])\b\s*,\s*\b([0-9]|[1-9][0-9]|1[0-9][0-9]|2[0-4][0-9]|25[0-5])\b\s*,\s*\b([0-9]|[1-9][0-9]|1[0-9][0-9]|2[0-4][0-9]|25[0-5])\b\s*\))|(rgb\(\s*(\d?\d%|100%)+\s*,\s*(\d?\d%|100%)+\s*,\s*(\d?\d%|100%)+\s*\)))$";
const DATA_URL: &str = r"^data:([a-z]+/[a-z0-9+.\-]+)?;(?:name=(.*);)?base64,(.*)$";

const MAX_HOSTNAME_LENGTH: usize = 253;

fn builtin_patterns() -> &'static HashMap<&'static str, Regex> {
    static PATTERNS: OnceLock<HashMap<&'static str, Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            ("email", EMAIL),
            ("hostname", HOSTNAME),
            ("ipv4", IPV4),
            ("uri", URI),
            ("uri-reference", URI_REFERENCE),
            ("time", TIME),
            ("json-pointer", JSON_POINTER),
            ("color", COLOR),
            ("data-url", DATA_URL),
        ]
        .into_iter()
        .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
        .collect()
    })
}

fn check_builtin(name: &str, value: &str) -> Option<bool> {
    let valid = match name {
        "date" => value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        "date-time" => DateTime::parse_from_rfc3339(value).is_ok(),
        "ipv6" => value.parse::<Ipv6Addr>().is_ok(),
        "uuid" => {
            let bare = value.strip_prefix("urn:uuid:").unwrap_or(value);
            bare.len() == 36 && Uuid::parse_str(bare).is_ok()
        }
        "regex" => fancy_regex::Regex::new(value).is_ok(),
        "hostname" => {
            value.len() <= MAX_HOSTNAME_LENGTH && builtin_patterns().get(name)?.is_match(value)
        }
        _ => builtin_patterns().get(name)?.is_match(value),
    };
    Some(valid)
}

/// Known string formats
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    custom: IndexMap<String, Regex>,
}

impl FormatRegistry {
    /// A registry with only the built-in formats
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from name to pattern pairs
    pub fn from_patterns(patterns: &IndexMap<String, String>) -> ValidateResult<Self> {
        patterns
            .iter()
            .try_fold(Self::new(), |registry, (name, pattern)| registry.with_format(name, pattern))
    }

    /// Registers a custom format; it shadows a built-in of the same name
    pub fn with_format(mut self, name: &str, pattern: &str) -> ValidateResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| ValidateError::InvalidFormat {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.custom.insert(name.to_string(), regex);
        Ok(self)
    }

    /// Names of the custom formats
    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }

    /// Returns whether `value` satisfies `format`; `None` when the format is
    /// unknown
    pub fn check(&self, format: &str, value: &str) -> Option<bool> {
        match self.custom.get(format) {
            Some(regex) => Some(regex.is_match(value)),
            None => check_builtin(format, value),
        }
    }

    pub fn is_known(&self, format: &str) -> bool {
        self.check(format, "").is_some()
    }
}
