//! CLI argument definitions using clap
//!
//! Commands:
//! - formschema resolve  [--config <path>] [--input <path>]
//! - formschema defaults [--config <path>] [--input <path>]
//! - formschema ids      [--config <path>] [--input <path>]
//! - formschema paths    [--config <path>] [--input <path>]
//! - formschema validate [--config <path>] [--input <path>]
//! - formschema state    [--config <path>] [--input <path>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// formschema - schema-driven form state
#[derive(Parser, Debug)]
#[command(name = "formschema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where a command reads its configuration and request from
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the JSON request (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the schema for the given form data
    Resolve {
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Merge schema defaults into the form data
    Defaults {
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Build the IdSchema
    Ids {
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Build the PathSchema
    Paths {
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Validate the form data
    Validate {
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Build the full form state, optionally applying one change
    State {
        #[command(flatten)]
        args: RequestArgs,
    },
}

impl Command {
    /// Name used for the command's log scope
    pub fn scope_name(&self) -> &'static str {
        match self {
            Command::Resolve { .. } => "FORM_RESOLVE",
            Command::Defaults { .. } => "FORM_DEFAULTS",
            Command::Ids { .. } => "FORM_IDS",
            Command::Paths { .. } => "FORM_PATHS",
            Command::Validate { .. } => "FORM_VALIDATE",
            Command::State { .. } => "FORM_STATE",
        }
    }

    pub fn args(&self) -> &RequestArgs {
        match self {
            Command::Resolve { args }
            | Command::Defaults { args }
            | Command::Ids { args }
            | Command::Paths { args }
            | Command::Validate { args }
            | Command::State { args } => args,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommand_with_paths() {
        let cli = Cli::try_parse_from(["formschema", "validate", "--config", "form.json", "--input", "req.json"]).unwrap();
        assert_eq!(cli.command.scope_name(), "FORM_VALIDATE");
        assert_eq!(cli.command.args().config, Some(PathBuf::from("form.json")));
        assert_eq!(cli.command.args().input, Some(PathBuf::from("req.json")));
    }

    #[test]
    fn test_paths_are_optional() {
        let cli = Cli::try_parse_from(["formschema", "defaults"]).unwrap();
        assert!(cli.command.args().config.is_none());
        assert!(cli.command.args().input.is_none());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["formschema", "render"]).is_err());
    }
}
