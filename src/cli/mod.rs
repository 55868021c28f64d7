//! CLI command definitions for settings-subst
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod render;

use crate::section::simple_type_name;
use anyhow::{Result, bail};
use crate::substitution::{UndefinedBehavior, VariableSyntax};
use clap::{Parser, Subcommand, ValueEnum};
use render::RenderArgs;

/// Reference styles expanded by `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliSyntax {
    /// `$NAME` and `${NAME}` (default)
    #[default]
    Unix,
    /// `%NAME%`
    Windows,
    /// Both styles
    Both,
}

impl From<CliSyntax> for VariableSyntax {
    fn from(syntax: CliSyntax) -> Self {
        match syntax {
            CliSyntax::Unix => VariableSyntax::Unix,
            CliSyntax::Windows => VariableSyntax::Windows,
            CliSyntax::Both => VariableSyntax::Both,
        }
    }
}

/// Handling of references to undefined variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliUndefined {
    /// Leave the reference as written (default)
    #[default]
    Keep,
    /// Replace it with an empty string
    Empty,
    /// Fail
    Error,
}

impl From<CliUndefined> for UndefinedBehavior {
    fn from(undefined: CliUndefined) -> Self {
        match undefined {
            CliUndefined::Keep => UndefinedBehavior::Keep,
            CliUndefined::Empty => UndefinedBehavior::Empty,
            CliUndefined::Error => UndefinedBehavior::Error,
        }
    }
}

/// Output format for rendered configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Settings substitution tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge configuration layers and expand variables in every string
    Render(RenderArgs),

    /// Print the section name a type binds to when it declares none
    SectionName {
        /// Type path, e.g. `my_app::settings::Database`
        #[arg(value_name = "TYPE_PATH")]
        type_path: String,
    },
}

/// Section name derived from a type path.
///
/// Fails when the input does not name a path type, such as a tuple.
pub fn section_name_for(type_path: &str) -> Result<&str> {
    let name = simple_type_name(type_path);
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    if !is_identifier {
        bail!("`{}` is not a type path", type_path.trim());
    }
    Ok(name)
}
