//! conceptbuild CLI: prepares conceptual documentation topics for the
//! build-assembly stage.
//!
//! Reads a content description, writes the table of contents, metadata,
//! manifests and per-topic files for one group.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
