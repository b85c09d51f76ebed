//! c3i: plan CI builds for a directory of conda recipes.

mod cli;
mod commands;
mod plan;
mod tracing;

use crate::cli::Cli;
use crate::tracing::TracingConfig;
use clap::Parser;

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    crate::tracing::init_tracing(&TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
    })?;

    commands::execute(cli.command)
}
