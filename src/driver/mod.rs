//! Storage driver abstraction.
//!
//! Every backend implements [`Driver`]; upper layers only ever see
//! `dyn Driver` and pick a concrete backend through a [`DriverRegistry`].

mod cancel;
pub mod mock;
pub mod registry;
pub mod sqlite;
mod value;

pub use cancel::Cancellation;
pub use mock::MockDriver;
pub use registry::{DriverConstructor, DriverRegistry};
pub use sqlite::SqliteDriver;
pub use value::{FromValue, Row, Rows, Value};

use serde::Serialize;

use crate::error::Result;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

/// Connection pool metrics. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub max_open: u32,
    pub open: u32,
    pub idle: u32,
    pub in_use: u32,
}

/// Statement surface shared by drivers and transactions.
///
/// The `*_ctx` variants honor a [`Cancellation`]: they fail with
/// `Cancelled` or `DeadlineExceeded` instead of returning partial results.
/// The plain variants run to completion.
pub trait Executor {
    fn execute_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value])
    -> Result<ExecResult>;

    /// Returns the first row, or `Error::NoRows` when nothing matched.
    fn query_row_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Row>;

    fn query_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Rows>;

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.execute_ctx(&Cancellation::new(), sql, params)
    }

    fn query_row(&self, sql: &str, params: &[Value]) -> Result<Row> {
        self.query_row_ctx(&Cancellation::new(), sql, params)
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        self.query_ctx(&Cancellation::new(), sql, params)
    }
}

/// A physical connection (or pool) to one storage backend.
pub trait Driver: Executor + Send + Sync + std::fmt::Debug {
    fn connect(&self) -> Result<()>;

    fn close(&self) -> Result<()>;

    fn ping(&self) -> Result<()>;

    fn begin_ctx(&self, cancel: &Cancellation) -> Result<Box<dyn Transaction>>;

    fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.begin_ctx(&Cancellation::new())
    }

    /// Backend type tag, used to pick a SQL dialect.
    fn driver_type(&self) -> &str;

    /// Connection string for the native driver.
    fn dsn(&self) -> String;

    /// Connection string for an external schema-migration tool.
    fn migration_dsn(&self) -> String;

    fn stats(&self) -> PoolStats;
}

/// A single-owner transaction. Dropping it without `commit` rolls back.
pub trait Transaction: Executor + Send {
    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}
