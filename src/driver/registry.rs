use std::collections::BTreeMap;

use tracing::debug;

use super::Driver;
use super::sqlite::{new_file_driver, new_memory_driver};
use crate::config::{DriverConfig, MEMORY_DRIVER, SQLITE_DRIVER};
use crate::error::{Error, Result};

/// Builds an unconnected driver from its configuration.
pub type DriverConstructor = fn(&DriverConfig) -> Result<Box<dyn Driver>>;

/// Lookup table from backend tag to constructor.
///
/// Assemble it once at startup and hand out `&DriverRegistry`; nothing
/// mutates it afterwards.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    constructors: BTreeMap<String, DriverConstructor>,
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the SQLite file-backed and in-memory backends.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SQLITE_DRIVER, new_file_driver);
        registry.register(MEMORY_DRIVER, new_memory_driver);
        registry
    }

    /// Adds or replaces the constructor for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, constructor: DriverConstructor) -> &mut Self {
        self.constructors.insert(tag.into(), constructor);
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Constructs the driver named by `config.driver_type` without connecting.
    pub fn create(&self, config: &DriverConfig) -> Result<Box<dyn Driver>> {
        let constructor = self.constructors.get(&config.driver_type).ok_or_else(|| {
            Error::Config(format!("unknown driver type '{}'", config.driver_type))
        })?;
        debug!(driver_type = %config.driver_type, "Creating driver");
        constructor(config)
    }

    /// Constructs and connects the driver.
    pub fn open(&self, config: &DriverConfig) -> Result<Box<dyn Driver>> {
        let driver = self.create(config)?;
        driver.connect()?;
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Executor, MockDriver};
    use crate::params;

    fn mock_constructor(_config: &DriverConfig) -> Result<Box<dyn Driver>> {
        Ok(Box::new(MockDriver::new()))
    }

    #[test]
    fn test_unknown_tag_names_the_tag() {
        let registry = DriverRegistry::builtin();
        let config = DriverConfig {
            driver_type: "postgres".to_string(),
            ..DriverConfig::default()
        };
        let err = registry.create(&config).unwrap_err();
        assert!(matches!(&err, Error::Config(msg) if msg.contains("'postgres'")));
    }

    #[test]
    fn test_builtin_tags() {
        let registry = DriverRegistry::builtin();
        assert_eq!(registry.tags(), vec!["memory", "sqlite"]);
        assert!(DriverRegistry::new().tags().is_empty());
    }

    #[test]
    fn test_file_driver_requires_path() {
        let registry = DriverRegistry::builtin();
        let err = registry.create(&DriverConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_open_memory_driver() {
        let registry = DriverRegistry::builtin();
        let driver = registry.open(&DriverConfig::memory()).unwrap();
        assert_eq!(driver.driver_type(), "sqlite");
        driver.ping().unwrap();
        let one: i64 = driver.query_row("SELECT 1", params![]).unwrap().get(0).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_custom_backend_registration() {
        let mut registry = DriverRegistry::new();
        registry.register("mock", mock_constructor);
        let config = DriverConfig {
            driver_type: "mock".to_string(),
            ..DriverConfig::default()
        };
        let driver = registry.open(&config).unwrap();
        assert_eq!(driver.driver_type(), "mock");
        assert!(registry.contains("mock"));
        assert!(!registry.contains("sqlite"));
    }
}
