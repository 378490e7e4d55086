//! Helpers for test suites of this crate and of code built on it.

use std::path::Path;

use crate::config::DriverConfig;
use crate::driver::{Driver, DriverRegistry};
use crate::error::Result;
use crate::store::SqlDataStore;
use crate::store::schema::{SCHEMA, statements};

/// Creates every table on a connected driver.
///
/// Production databases are migrated by an external runner; this exists
/// so tests can start from an empty database.
pub fn bootstrap_schema(driver: &dyn Driver) -> Result<()> {
    let tx = driver.begin()?;
    for statement in statements(SCHEMA) {
        tx.execute(&statement, crate::params![])?;
    }
    tx.commit()
}

/// A connected in-memory SQLite driver with the schema applied.
pub fn memory_driver() -> Result<Box<dyn Driver>> {
    let driver = DriverRegistry::builtin().open(&DriverConfig::memory())?;
    bootstrap_schema(driver.as_ref())?;
    Ok(driver)
}

/// An `SqlDataStore` over a fresh in-memory database.
pub fn memory_store() -> Result<SqlDataStore> {
    Ok(SqlDataStore::new(memory_driver()?))
}

/// An `SqlDataStore` over a fresh database file at `path`.
pub fn file_store(path: impl AsRef<Path>) -> Result<SqlDataStore> {
    let driver = DriverRegistry::builtin().open(&DriverConfig::sqlite(path))?;
    bootstrap_schema(driver.as_ref())?;
    Ok(SqlDataStore::new(driver))
}
