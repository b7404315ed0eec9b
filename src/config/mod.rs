//! Configuration module for Dockhand
//!
//! A deploy is described by one key=value file (default `deploy.conf`).
//! CLI flags only toggle per-run behaviour (no-cache, dry-run, ...); they
//! never override values from the file.

mod loader;
mod types;

pub use loader::{
    from_entries, load, parse_entries, unknown_key_warnings, ConfigEntries, ConfigEntry,
    ConfigWarning,
};
pub use types::*;

impl DeployConfig {
    /// Load a config file, discarding warnings
    pub fn load(path: &std::path::Path) -> Result<Self, crate::error::ConfigError> {
        loader::load(path).map(|(config, _)| config)
    }
}
