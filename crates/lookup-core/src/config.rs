//! Configuration management for rbw-lookup

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides the configured `rbw` binary
pub const CLI_PATH_ENV: &str = "RBW_LOOKUP_CLI_PATH";

/// rbw-lookup configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Path or name of the `rbw` binary
    #[serde(default = "default_cli_path")]
    pub cli_path: String,

    /// Substrings of the tool's stderr that mean "no such entry"
    #[serde(default = "default_not_found_markers")]
    pub not_found_markers: Vec<String>,
}

fn default_cli_path() -> String {
    "rbw".to_string()
}

fn default_not_found_markers() -> Vec<String> {
    vec!["Not found.".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cli_path: default_cli_path(),
            not_found_markers: default_not_found_markers(),
        }
    }
}

/// The `rbw` binary override from the process environment, if any
pub fn env_cli_path() -> Option<String> {
    std::env::var(CLI_PATH_ENV).ok()
}

impl Config {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Replace the binary path when an override is given
    ///
    /// Empty overrides are ignored so that `RBW_LOOKUP_CLI_PATH=` does not
    /// blank out a configured path.
    pub fn with_cli_path(mut self, cli_path: Option<String>) -> Self {
        if let Some(path) = cli_path.filter(|p| !p.trim().is_empty()) {
            self.cli_path = path;
        }
        self
    }
}
