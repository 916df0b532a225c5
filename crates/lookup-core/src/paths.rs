//! Standard paths used by rbw-lookup

use std::path::PathBuf;

/// Standard rbw-lookup paths
pub struct Paths {
    /// Config directory (~/.config/rbw-lookup)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("rbw-lookup");

        Self { config }
    }

    /// Get the path of the main config file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}
