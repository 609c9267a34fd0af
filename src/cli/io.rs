//! JSON I/O handling for CLI
//!
//! - Input: one JSON request, from a file or stdin
//! - Output: one JSON response line on stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::schema::Schema;
use crate::ui::UiSchema;

/// One CLI request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRequest {
    pub schema: Value,
    #[serde(default)]
    pub form_data: Value,
    #[serde(default)]
    pub ui_schema: Value,
    /// Applied by the `state` command after the initial state is built
    #[serde(default)]
    pub change: Option<ChangeRequest>,
}

/// A subtree replacement
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRequest {
    pub path: Vec<String>,
    pub value: Value,
}

impl FormRequest {
    /// Parses a request value
    pub fn from_value(value: Value) -> CliResult<Self> {
        serde_json::from_value(value).map_err(|e| CliError::invalid_request(e.to_string()))
    }

    pub fn schema(&self) -> CliResult<Schema> {
        Schema::from_value(self.schema.clone()).map_err(|e| CliError::invalid_request(e.message().to_string()))
    }

    pub fn ui_schema(&self) -> CliResult<UiSchema> {
        UiSchema::from_value(self.ui_schema.clone()).map_err(|e| CliError::invalid_request(e.to_string()))
    }
}

/// Read a JSON request from `input`, or stdin when absent
pub fn read_request(input: Option<&Path>) -> CliResult<Value> {
    let content = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().lock().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if content.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(&content)?;
    Ok(value)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
