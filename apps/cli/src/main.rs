//! docflow CLI: ingest document change events and extract page metadata.
//!
//! Lands raw Confluence pages, starts the extraction workflow, and turns
//! landed pages into ground-truth metadata records.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = commands::resolve_config(&cli)?;
    commands::init_tracing(&cli, &config);
    commands::run(cli, config).await
}
