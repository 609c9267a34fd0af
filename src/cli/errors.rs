//! CLI-specific error types
//!
//! Library failures keep the code of the error that caused them.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::form::FormError;
use crate::schema::SchemaError;
use crate::ui::UiError;
use crate::validation::ValidateError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (input file, stdin, stdout)
    IoError,
    /// Request JSON does not have the expected shape
    InvalidRequest,
    /// A library operation failed; carries its error code
    OperationFailed(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FORM_CLI_CONFIG_ERROR",
            Self::IoError => "FORM_CLI_IO_ERROR",
            Self::InvalidRequest => "FORM_CLI_INVALID_REQUEST",
            Self::OperationFailed(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Malformed request
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    /// Library failure with its own code
    pub fn operation_failed(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::OperationFailed(code), msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::operation_failed(e.code().code(), e.message())
    }
}

impl From<ValidateError> for CliError {
    fn from(e: ValidateError) -> Self {
        Self::operation_failed(e.code(), e.to_string())
    }
}

impl From<FormError> for CliError {
    fn from(e: FormError) -> Self {
        Self::operation_failed(e.code(), e.to_string())
    }
}

impl From<UiError> for CliError {
    fn from(e: UiError) -> Self {
        Self::operation_failed(e.code(), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
