//! corpusgen CLI: build-time content pipeline.
//!
//! Turns hand-authored content modules into the static JSON artifacts the
//! site consumes at runtime.

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
