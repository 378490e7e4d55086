//! # devspace-store
//!
//! Persistence layer for a developer-workspace manager: an ecosystem →
//! domain → app → workspace hierarchy, configuration catalogs, and the
//! active selection, behind pluggable storage drivers.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! devspace-store = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use devspace_store::config::DriverConfig;
//! use devspace_store::driver::DriverRegistry;
//! use devspace_store::store::{HierarchyStore, SqlDataStore};
//!
//! let registry = DriverRegistry::builtin();
//! let store = SqlDataStore::open(&registry, &DriverConfig::sqlite("./devspace.db"))?;
//! for eco in store.list_ecosystems()? {
//!     println!("{}", eco.name);
//! }
//! ```
//!
//! The schema itself is applied by an external migration runner from
//! `migrations/`; [`testing::bootstrap_schema`] applies it for tests.
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `devspace-store` maintenance binary.
//!   Disable with `default-features = false`.

pub mod config;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod store;
pub mod testing;
pub mod types;

pub use error::{Error, Result};
