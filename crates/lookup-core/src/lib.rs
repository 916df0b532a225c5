//! lookup-core - Shared functionality for rbw-lookup
//!
//! Standard paths, the JSON configuration file, and helpers for running
//! external command-line tools to completion.

pub mod config;
pub mod paths;
pub mod process;

pub use config::Config;
pub use paths::Paths;
