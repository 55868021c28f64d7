//! settings-subst
//!
//! Renders layered YAML configuration with environment variable references
//! expanded in every string value.

use anyhow::Result;
use clap::Parser;
use settings_substitution::cli::{Cli, Command, render, section_name_for};
use settings_substitution::logging::{self, LogTarget};
use std::io::Write;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse()?;
    logging::init(&target, cli.verbose)?;

    let output = match &cli.command {
        Command::Render(args) => render::execute(args)?,
        Command::SectionName { type_path } => format!("{}\n", section_name_for(type_path)?),
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
