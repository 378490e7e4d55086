use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const SQLITE_DRIVER: &str = "sqlite";
pub const MEMORY_DRIVER: &str = "memory";

/// Options recognized by the driver constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Registry tag selecting the backend.
    #[serde(rename = "type")]
    pub driver_type: String,
    /// Database file. Required for file-backed drivers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// 0 selects the backend default.
    pub max_open_conns: u32,
    /// 0 selects the backend default.
    pub max_idle_conns: u32,
    pub busy_timeout_ms: u64,
}

impl DriverConfig {
    pub fn sqlite<P: AsRef<Path>>(path: P) -> Self {
        Self {
            driver_type: SQLITE_DRIVER.to_string(),
            path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    pub fn memory() -> Self {
        Self {
            driver_type: MEMORY_DRIVER.to_string(),
            ..Self::default()
        }
    }

    /// Absolute database path for file-backed drivers.
    pub fn absolute_path(&self) -> Result<PathBuf> {
        let path = self
            .path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "driver type '{}' requires a database path",
                    self.driver_type
                ))
            })?;
        Ok(std::path::absolute(path)?)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            driver_type: SQLITE_DRIVER.to_string(),
            path: None,
            max_open_conns: 0,
            max_idle_conns: 0,
            busy_timeout_ms: 5000,
        }
    }
}
