mod database;

pub use database::{DriverConfig, MEMORY_DRIVER, SQLITE_DRIVER};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level settings, usually read from `config.toml` in the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DriverConfig,
    /// Base directory under which each workspace gets `<slug>/`.
    pub workspaces_dir: PathBuf,
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// `$HOME/.devspace`, or `./.devspace` when no home is set.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".devspace")
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Self::default_data_dir();
        Self {
            database: DriverConfig::sqlite(data_dir.join("devspace.db")),
            workspaces_dir: data_dir.join("workspaces"),
        }
    }
}
