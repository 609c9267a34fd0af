//! formschema - JSON-Schema-driven form state
//!
//! Resolves schemas against form data, merges declared defaults, mirrors
//! the schema into id and path trees, and validates data into a nested
//! error schema.

pub mod cli;
pub mod config;
pub mod form;
pub mod observability;
pub mod schema;
pub mod tree;
pub mod ui;
pub mod util;
pub mod validation;
