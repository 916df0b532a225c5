//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lookup_core::config::env_cli_path;
use lookup_core::process::find_program;
use lookup_core::{Config, Paths};
use rbw_lookup::{flatten, lookup, LookupError, RbwClient, Vault};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// rbw-lookup - Retrieve secrets from rbw
#[derive(Parser)]
#[command(name = "rbw-lookup")]
#[command(version)]
#[command(about = "Retrieve secrets from rbw (alternative Bitwarden client) as JSON")]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "\
EXAMPLES:
    rbw-lookup a_test --field password       'password' from records named a_test
    rbw-lookup bafba515-af11-47e6-abe3-af1200cd18b2 --field password --flatten
    rbw-lookup a_test                        Full records named a_test
    rbw-lookup a_test --field api_key        Custom field 'api_key'
    rbw-lookup status                        Is the vault unlocked?

FIELDS:
    A field is looked up in the record's custom fields first, then in its
    built-in data (username, password, totp, ...), then at the top level.

CONFIG:
    ~/.config/rbw-lookup/config.json   {\"cli_path\": \"rbw\", \"not_found_markers\": [\"Not found.\"]}
    RBW_LOOKUP_CLI_PATH                Overrides cli_path")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Needles passed to `rbw get` (uuid, name or uri)
    pub terms: Vec<String>,

    /// Field to fetch; leave unset to fetch whole records
    #[arg(short, long)]
    pub field: Option<String>,

    /// Print one flat list of values instead of one list per term
    #[arg(long)]
    pub flatten: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Path to the rbw binary
    #[arg(long, global = true, value_name = "PATH")]
    pub rbw_path: Option<String>,

    /// Config file (default: ~/.config/rbw-lookup/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show whether the vault is unlocked and which rbw binary is used
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Vault status report
#[derive(Debug, Serialize)]
struct Status {
    cli_path: String,
    resolved_path: Option<PathBuf>,
    /// Whether the binary could be started at all
    available: bool,
    unlocked: bool,
}

impl Status {
    /// Query the client; a binary that cannot be started reports as locked
    fn check(client: &RbwClient) -> Result<Self> {
        let (available, unlocked) = match client.is_unlocked() {
            Ok(unlocked) => (true, unlocked),
            Err(LookupError::Spawn { .. }) => (false, false),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            cli_path: client.cli_path().to_string(),
            resolved_path: find_program(client.cli_path()),
            available,
            unlocked,
        })
    }
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let client = RbwClient::from_config(&config);

    match cli.command {
        Some(Commands::Status { json }) => cmd_status(&client, json),
        None => cmd_lookup(
            &client,
            &cli.terms,
            cli.field.as_deref(),
            cli.flatten,
            cli.pretty,
        ),
    }
}

/// Resolve configuration: flag, then environment, then file, then defaults
fn load_config(cli: &Cli) -> Result<Config> {
    load_config_with(cli, env_cli_path())
}

/// Same as `load_config` with the environment override passed in
fn load_config_with(cli: &Cli, env_override: Option<String>) -> Result<Config> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| Paths::new().config_file());

    let config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    Ok(config
        .with_cli_path(env_override)
        .with_cli_path(cli.rbw_path.clone()))
}

/// Look up terms and print the results as JSON
fn cmd_lookup(
    client: &RbwClient,
    terms: &[String],
    field: Option<&str>,
    flat: bool,
    pretty: bool,
) -> Result<()> {
    let results = lookup(client, terms, field)?;

    let output = if flat {
        Value::Array(flatten(results))
    } else {
        Value::Array(results.into_iter().map(Value::Array).collect())
    };

    println!("{}", render(&output, pretty)?);
    Ok(())
}

/// Show vault status
fn cmd_status(client: &RbwClient, json: bool) -> Result<()> {
    let status = Status::check(client)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match &status.resolved_path {
        Some(path) => println!("rbw:   {}", path.display()),
        None => println!("rbw:   {} (not found on PATH)", status.cli_path),
    }
    println!(
        "vault: {}",
        if !status.available {
            "unavailable"
        } else if status.unlocked {
            "unlocked"
        } else {
            "locked"
        }
    );

    Ok(())
}

fn render(value: &Value, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}
