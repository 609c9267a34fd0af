//! CLI command implementations
//!
//! Every command loads the configuration, reads one request, runs one
//! library operation and writes one response. Failures are reported as an
//! error response and a non-zero exit.

use std::path::Path;

use serde_json::Value;

use crate::config::FormConfig;
use crate::form::{DefaultMerger, FormState, MirrorBuilder};
use crate::observability::{Logger, ObservationScope};
use crate::schema::{resolve_schema, Definitions};
use crate::validation::{validate_form_data, ValidateOptions};

use super::args::{Command, RequestArgs};
use super::errors::CliResult;
use super::io::{read_request, write_error, write_response, FormRequest};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let scope = ObservationScope::new(cmd.scope_name());
    match execute(&cmd) {
        Ok(data) => {
            scope.complete(&[]);
            write_response(data)
        }
        Err(e) => {
            scope.fail(e.message());
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Runs `cmd` and returns the response data
pub fn execute(cmd: &Command) -> CliResult<Value> {
    let RequestArgs { config, input } = cmd.args();
    let config = load_config(config.as_deref())?;
    let request = FormRequest::from_value(read_request(input.as_deref())?)?;

    match cmd {
        Command::Resolve { .. } => resolve(&request),
        Command::Defaults { .. } => defaults(&request, &config),
        Command::Ids { .. } => ids(&request, &config),
        Command::Paths { .. } => paths(&request, &config),
        Command::Validate { .. } => validate(&request, &config),
        Command::State { .. } => state(&request, &config),
    }
}

/// Loads the configuration and applies its log level
pub fn load_config(path: Option<&Path>) -> CliResult<FormConfig> {
    let config = match path {
        Some(path) => FormConfig::load(path)?,
        None => FormConfig::default(),
    };
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

/// Resolved schema for the request's data
pub fn resolve(request: &FormRequest) -> CliResult<Value> {
    let schema = request.schema()?;
    let definitions = Definitions::from_root(&schema)?;
    let resolved = resolve_schema(&schema, &definitions, &request.form_data)?;
    Ok(resolved.to_value()?)
}

/// Form data with defaults merged in
pub fn defaults(request: &FormRequest, config: &FormConfig) -> CliResult<Value> {
    let schema = request.schema()?;
    let definitions = Definitions::from_root(&schema)?;
    let state = DefaultMerger::new(&definitions)
        .include_undefined(config.include_undefined_values)
        .max_depth(config.max_depth)
        .max_padded_items(config.max_padded_items)
        .default_form_state(&schema, &request.form_data)?;
    Ok(state)
}

/// IdSchema rooted at `ui:rootFieldId` or the configured prefix
pub fn ids(request: &FormRequest, config: &FormConfig) -> CliResult<Value> {
    let schema = request.schema()?;
    let ui_schema = request.ui_schema()?;
    let definitions = Definitions::from_root(&schema)?;
    let ids = MirrorBuilder::new(&definitions).max_depth(config.max_depth).id_schema(
        &schema,
        ui_schema.root_field_id.as_deref(),
        &request.form_data,
        &config.id_prefix,
    )?;
    Ok(ids.to_value())
}

/// PathSchema for the request's data
pub fn paths(request: &FormRequest, config: &FormConfig) -> CliResult<Value> {
    let schema = request.schema()?;
    let definitions = Definitions::from_root(&schema)?;
    let paths = MirrorBuilder::new(&definitions)
        .max_depth(config.max_depth)
        .path_schema(&schema, "", &request.form_data)?;
    Ok(paths.to_value())
}

/// Validation report with the configured custom formats
pub fn validate(request: &FormRequest, config: &FormConfig) -> CliResult<Value> {
    let schema = request.schema()?;
    let options = ValidateOptions::new().with_formats(config.formats()?);
    let report = validate_form_data(&request.form_data, &schema, &options)?;
    Ok(serde_json::to_value(report)?)
}

/// Full form state, after the request's change when one is given
pub fn state(request: &FormRequest, config: &FormConfig) -> CliResult<Value> {
    let options = ValidateOptions::new().with_formats(config.formats()?);
    let mut state = FormState::from_props(
        request.schema()?,
        request.ui_schema()?,
        request.form_data.clone(),
        config,
        Some(&options),
    )?;
    if let Some(change) = &request.change {
        state = state.change(&change.path, change.value.clone(), Some(&options))?;
    }
    Ok(serde_json::to_value(state)?)
}
