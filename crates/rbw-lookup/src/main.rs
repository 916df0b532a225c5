//! rbw-lookup - Retrieve secrets from rbw as structured data
//!
//! Checks that the rbw vault is unlocked, fetches one entry per search term
//! with `rbw get --raw`, and prints the requested field (or the whole entry)
//! as JSON on stdout. Logs go to stderr; set RUST_LOG=rbw_lookup=debug to
//! see each rbw invocation.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for JSON output)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli::run(cli)
}
