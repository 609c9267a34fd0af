//! Schema subsystem for formschema
//!
//! Typed JSON Schema documents, local `$ref` resolution, combinator branch
//! selection and the inspection helpers the form layer relies on.
//!
//! # Design Principles
//!
//! - Schemas are immutable once loaded
//! - Resolution is a pure function of schema, definitions and data
//! - A reference cycle is a hard failure, never a silent truncation
//! - Unknown keywords survive every merge untouched

mod definitions;
mod errors;
mod matching;
mod merge;
mod resolver;
mod types;
pub mod utils;

pub use definitions::Definitions;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use matching::{get_matching_option, OptionMatch};
pub use merge::{merge_all_of, merge_objects, merge_schemas, overlay};
pub use resolver::{resolve_schema, retrieve_schema, SchemaResolver};
pub use types::{Dependency, Items, Schema, SchemaOrBool, SchemaType, TypeSet, ADDITIONAL_PROPERTY_FLAG};
