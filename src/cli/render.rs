//! Render command: merge configuration layers and expand variables.

use super::{CliSyntax, CliUndefined, OutputFormat};
use crate::config::ConfigSource;
use crate::graph::{Configurator, ConfiguratorOptions};
use crate::substitution::{
    EnvSubstitutionConfig, EnvironmentVariablesSubstitution, ProcessEnv, VariableSource,
};
use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Directory under the platform config dir holding the user layer.
pub const USER_CONFIG_DIR: &str = "settings-subst";

/// Arguments for the render subcommand
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// YAML configuration files, lowest priority first
    #[arg(short, long = "config", value_name = "FILE", required = true)]
    pub config: Vec<PathBuf>,

    /// Section to print, `:`-separated (default: everything)
    #[arg(short, long, value_name = "PATH")]
    pub section: Option<String>,

    /// Apply environment variables with this prefix as the highest layer
    #[arg(long, value_name = "PREFIX")]
    pub env_prefix: Option<String>,

    /// Reference styles to expand
    #[arg(long, value_enum, default_value_t = CliSyntax::Unix)]
    pub syntax: CliSyntax,

    /// Handling of undefined variables
    #[arg(long, value_enum, default_value_t = CliUndefined::Keep)]
    pub undefined: CliUndefined,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Maximum nesting depth before failing
    #[arg(long, default_value_t = 64)]
    pub max_depth: usize,

    /// Skip the user configuration file
    #[arg(long)]
    pub no_user_config: bool,
}

/// The user layer: `<config dir>/settings-subst/config.yaml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join("config.yaml"))
}

/// Run the render command against the process environment.
pub fn execute(args: &RenderArgs) -> Result<String> {
    execute_with(args, ProcessEnv, std::env::vars())
}

/// Run the render command, resolving references from `variables` and
/// environment overrides from `env`.
pub fn execute_with<V: VariableSource>(
    args: &RenderArgs,
    variables: V,
    env: impl IntoIterator<Item = (String, String)>,
) -> Result<String> {
    let mut source = ConfigSource::new();
    if !args.no_user_config
        && let Some(path) = user_config_path()
    {
        source = source.with_optional_yaml_file(path)?;
    }
    for path in &args.config {
        source = source.with_yaml_file(path)?;
    }
    if let Some(prefix) = &args.env_prefix {
        source = source.with_env_vars(prefix, env);
    }

    let mut value = match &args.section {
        Some(section) => source
            .section(section)
            .with_context(|| format!("Section `{}` not found", section))?,
        None => source.merged(),
    };

    let substitution = EnvironmentVariablesSubstitution::with_source(variables).with_config(
        EnvSubstitutionConfig {
            syntax: args.syntax.into(),
            undefined: args.undefined.into(),
        },
    );
    Configurator::new(substitution)
        .with_options(ConfiguratorOptions {
            max_depth: args.max_depth,
        })
        .configure(&mut value)
        .context("Variable substitution failed")?;

    info!(layers = source.origins().count(), "Rendered configuration");
    format_value(&value, args.format)
}

fn format_value(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
            text.push('\n');
            Ok(text)
        }
    }
}
