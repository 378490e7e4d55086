//! Scriptable in-process `Driver` for tests.
//!
//! The mock never parses SQL. Results are served from queues filled by the
//! test (`push_exec_result`, `push_row`, `push_rows`); with empty queues it
//! answers like an empty database: inserts succeed with increasing ids,
//! `query_row` reports `NoRows`, `query` returns no rows. Every call is
//! recorded for later inspection.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Cancellation, Driver, ExecResult, Executor, PoolStats, Row, Rows, Transaction, Value};
use crate::error::{Error, Result};

pub const MOCK_DRIVER: &str = "mock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockMethod {
    Connect,
    Close,
    Ping,
    Execute,
    QueryRow,
    Query,
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub method: MockMethod,
    pub sql: String,
    pub params: Vec<Value>,
    pub in_transaction: bool,
}

#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    calls: Vec<MockCall>,
    exec_results: VecDeque<ExecResult>,
    row_results: VecDeque<Row>,
    rows_results: VecDeque<Rows>,
    failures: HashMap<MockMethod, VecDeque<Error>>,
    last_insert_id: i64,
    open_transactions: u32,
    commits: usize,
    rollbacks: usize,
}

impl MockState {
    fn record(&mut self, method: MockMethod, sql: &str, params: &[Value], in_transaction: bool) {
        self.calls.push(MockCall {
            method,
            sql: sql.to_string(),
            params: params.to_vec(),
            in_transaction,
        });
    }

    fn take_failure(&mut self, method: MockMethod) -> Result<()> {
        match self.failures.get_mut(&method).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Shared preamble of every statement: cancellation, connection state,
    /// recording and scripted failures, in that order.
    fn statement(
        &mut self,
        method: MockMethod,
        cancel: &Cancellation,
        sql: &str,
        params: &[Value],
        in_transaction: bool,
    ) -> Result<()> {
        cancel.check()?;
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.record(method, sql, params, in_transaction);
        self.take_failure(method)
    }

    fn next_exec(&mut self) -> ExecResult {
        self.exec_results.pop_front().unwrap_or_else(|| {
            self.last_insert_id += 1;
            ExecResult {
                last_insert_id: self.last_insert_id,
                rows_affected: 1,
            }
        })
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Clones share state, so a test can keep a handle to a driver it has
/// moved into a store.
#[derive(Debug, Clone)]
pub struct MockDriver {
    driver_type: String,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self::with_type(MOCK_DRIVER)
    }

    /// A mock declaring another backend type, e.g. to drive dialect selection.
    pub fn with_type(driver_type: impl Into<String>) -> Self {
        Self {
            driver_type: driver_type.into(),
            state: Arc::default(),
        }
    }

    /// A mock that is already connected.
    pub fn connected() -> Self {
        let driver = Self::new();
        lock(&driver.state).connected = true;
        driver
    }

    pub fn push_exec_result(&self, result: ExecResult) -> &Self {
        lock(&self.state).exec_results.push_back(result);
        self
    }

    pub fn push_row(&self, row: Row) -> &Self {
        lock(&self.state).row_results.push_back(row);
        self
    }

    pub fn push_rows(&self, rows: Rows) -> &Self {
        lock(&self.state).rows_results.push_back(rows);
        self
    }

    /// Makes the next call of `method` fail with `err`.
    pub fn fail_next(&self, method: MockMethod, err: Error) -> &Self {
        lock(&self.state)
            .failures
            .entry(method)
            .or_default()
            .push_back(err);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.state).calls.clone()
    }

    pub fn calls_to(&self, method: MockMethod) -> Vec<MockCall> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    pub fn commits(&self) -> usize {
        lock(&self.state).commits
    }

    pub fn rollbacks(&self) -> usize {
        lock(&self.state).rollbacks
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}

impl Executor for MockDriver {
    fn execute_ctx(
        &self,
        cancel: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult> {
        let mut state = lock(&self.state);
        state.statement(MockMethod::Execute, cancel, sql, params, false)?;
        Ok(state.next_exec())
    }

    fn query_row_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Row> {
        let mut state = lock(&self.state);
        state.statement(MockMethod::QueryRow, cancel, sql, params, false)?;
        state.row_results.pop_front().ok_or(Error::NoRows)
    }

    fn query_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Rows> {
        let mut state = lock(&self.state);
        state.statement(MockMethod::Query, cancel, sql, params, false)?;
        Ok(state.rows_results.pop_front().unwrap_or_else(Rows::empty))
    }
}

impl Driver for MockDriver {
    fn connect(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(MockMethod::Connect, "", &[], false);
        state.take_failure(MockMethod::Connect)?;
        state.connected = true;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(MockMethod::Close, "", &[], false);
        state.take_failure(MockMethod::Close)?;
        state.connected = false;
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.statement(MockMethod::Ping, &Cancellation::new(), "", &[], false)
    }

    fn begin_ctx(&self, cancel: &Cancellation) -> Result<Box<dyn Transaction>> {
        let mut state = lock(&self.state);
        state.statement(MockMethod::Begin, cancel, "", &[], false)?;
        state.open_transactions += 1;
        Ok(Box::new(MockTransaction {
            state: Arc::clone(&self.state),
            finished: false,
        }))
    }

    fn driver_type(&self) -> &str {
        &self.driver_type
    }

    fn dsn(&self) -> String {
        format!("{}://", self.driver_type)
    }

    fn migration_dsn(&self) -> String {
        format!("{}://", self.driver_type)
    }

    fn stats(&self) -> PoolStats {
        let state = lock(&self.state);
        let open = u32::from(state.connected);
        PoolStats {
            max_open: 1,
            open,
            idle: open.saturating_sub(state.open_transactions.min(1)),
            in_use: state.open_transactions,
        }
    }
}

pub struct MockTransaction {
    state: Arc<Mutex<MockState>>,
    finished: bool,
}

impl MockTransaction {
    fn finish(&mut self, method: MockMethod) -> Result<()> {
        if self.finished {
            return Err(Error::TransactionClosed);
        }
        let mut state = lock(&self.state);
        state.record(method, "", &[], true);
        state.take_failure(method)?;
        self.finished = true;
        state.open_transactions = state.open_transactions.saturating_sub(1);
        match method {
            MockMethod::Commit => state.commits += 1,
            _ => state.rollbacks += 1,
        }
        Ok(())
    }

    fn live(&self) -> Result<MutexGuard<'_, MockState>> {
        if self.finished {
            return Err(Error::TransactionClosed);
        }
        Ok(lock(&self.state))
    }
}

impl Executor for MockTransaction {
    fn execute_ctx(
        &self,
        cancel: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult> {
        let mut state = self.live()?;
        state.statement(MockMethod::Execute, cancel, sql, params, true)?;
        Ok(state.next_exec())
    }

    fn query_row_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Row> {
        let mut state = self.live()?;
        state.statement(MockMethod::QueryRow, cancel, sql, params, true)?;
        state.row_results.pop_front().ok_or(Error::NoRows)
    }

    fn query_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Rows> {
        let mut state = self.live()?;
        state.statement(MockMethod::Query, cancel, sql, params, true)?;
        Ok(state.rows_results.pop_front().unwrap_or_else(Rows::empty))
    }
}

impl Transaction for MockTransaction {
    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish(MockMethod::Commit)
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish(MockMethod::Rollback)
    }
}

impl Drop for MockTransaction {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = lock(&self.state);
            state.open_transactions = state.open_transactions.saturating_sub(1);
            state.rollbacks += 1;
        }
    }
}
