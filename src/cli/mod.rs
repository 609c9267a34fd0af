//! CLI module for formschema
//!
//! Provides one subcommand per library operation:
//! - resolve: Resolved schema for the given data
//! - defaults: Data with schema defaults merged in
//! - ids / paths: IdSchema and PathSchema mirrors
//! - validate: Validation report
//! - state: Full form state, optionally after one change

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, RequestArgs};
pub use commands::{execute, load_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response, ChangeRequest, FormRequest};
