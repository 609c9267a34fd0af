//! Form configuration
//!
//! Loaded from a JSON file; every key is optional:
//!
//! ```json
//! {
//!   "id_prefix": "root",
//!   "include_undefined_values": false,
//!   "max_depth": 64,
//!   "max_padded_items": 10000,
//!   "custom_formats": {"zip-code": "^\\d{5}$"},
//!   "log_level": "info"
//! }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::{DEFAULT_ID_PREFIX, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PADDED_ITEMS};
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::validation::FormatRegistry;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings shared by every form operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Root field id when the UI hints name none (default: "root")
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Emit `null` for properties with neither data nor default
    #[serde(default)]
    pub include_undefined_values: bool,

    /// Nesting limit for defaults and mirrors (default: 64)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Most array elements `minItems` may synthesise (default: 10000)
    #[serde(default = "default_max_padded_items")]
    pub max_padded_items: usize,

    /// Custom string formats, name to regular expression
    #[serde(default)]
    pub custom_formats: IndexMap<String, String>,

    /// Minimum log severity: trace, info, warn or error (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_id_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_padded_items() -> usize {
    DEFAULT_MAX_PADDED_ITEMS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            include_undefined_values: false,
            max_depth: default_max_depth(),
            max_padded_items: default_max_padded_items(),
            custom_formats: IndexMap::new(),
            log_level: default_log_level(),
        }
    }
}

impl FormConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let config = Self::from_json(&content)?;

        let path = path.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: FormConfig = serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.id_prefix.is_empty() {
            return Err(ConfigError::Invalid("id_prefix must not be empty".into()));
        }

        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be > 0".into()));
        }

        self.severity()?;
        self.formats()?;
        Ok(())
    }

    /// Minimum log severity
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Registry holding the built-in and the configured custom formats
    pub fn formats(&self) -> ConfigResult<FormatRegistry> {
        FormatRegistry::from_patterns(&self.custom_formats).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
