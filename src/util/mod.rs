//! Value helpers for form widgets
//!
//! Date parts for split date inputs and decoding of `data:` URLs produced
//! by file inputs.

mod data_uri;
mod dates;

pub use data_uri::{data_uri_to_blob, DataBlob};
pub use dates::{pad, parse_date_string, to_date_string, DateObject};

use thiserror::Error;

/// Value helper errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UtilError {
    #[error("Unable to parse date {0}")]
    UnparsableDate(String),

    #[error("Invalid date parts: {0}")]
    InvalidDate(String),

    #[error("Malformed data URL: {0}")]
    MalformedDataUri(String),
}

pub type UtilResult<T> = Result<T, UtilError>;
