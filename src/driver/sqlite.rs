use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode, OpenFlags, params_from_iter};
use tracing::{debug, info, warn};

use super::{Cancellation, Driver, ExecResult, Executor, PoolStats, Row, Rows, Transaction, Value};
use crate::config::{DriverConfig, SQLITE_DRIVER};
use crate::error::{Error, Result};

const DEFAULT_MAX_OPEN: u32 = 10;
const DEFAULT_MAX_IDLE: u32 = 1;
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const ACQUIRE_POLL: Duration = Duration::from_millis(50);
/// VM instructions between cancellation checks of a running statement.
const PROGRESS_OPS: i32 = 1000;

type SqlitePool = Pool<SqliteConnectionManager>;
type SqlitePooled = PooledConnection<SqliteConnectionManager>;

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    /// Named shared-cache memory database, unique per driver.
    Memory(String),
}

struct Connected {
    pool: SqlitePool,
    /// Keeps an in-memory database alive while the pool has no connections.
    _pin: Option<Mutex<Connection>>,
}

/// SQLite backend over an r2d2 connection pool.
pub struct SqliteDriver {
    config: DriverConfig,
    target: Target,
    state: RwLock<Option<Connected>>,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("target", &self.target)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl SqliteDriver {
    /// File-backed driver. The path is resolved to an absolute path now.
    pub fn file(config: &DriverConfig) -> Result<Self> {
        let path = config.absolute_path()?;
        Ok(Self {
            config: config.clone(),
            target: Target::File(path),
            state: RwLock::new(None),
        })
    }

    pub fn memory(config: &DriverConfig) -> Self {
        let name = format!("devspace-{}", uuid::Uuid::new_v4().simple());
        Self {
            config: config.clone(),
            target: Target::Memory(name),
            state: RwLock::new(None),
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.target, Target::Memory(_))
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().map(|s| s.is_some()).unwrap_or(false)
    }

    fn max_open(&self) -> u32 {
        match self.config.max_open_conns {
            0 => DEFAULT_MAX_OPEN,
            n => n,
        }
    }

    fn max_idle(&self) -> u32 {
        let idle = match self.config.max_idle_conns {
            0 => DEFAULT_MAX_IDLE,
            n => n,
        };
        idle.min(self.max_open())
    }

    fn open_target(&self) -> String {
        match &self.target {
            Target::File(path) => path.to_string_lossy().into_owned(),
            Target::Memory(name) => format!("file:{name}?mode=memory&cache=shared"),
        }
    }

    fn pool(&self) -> Result<SqlitePool> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state
            .as_ref()
            .map(|c| c.pool.clone())
            .ok_or(Error::NotConnected)
    }

    /// Waits for a pooled connection, giving up when `cancel` fires or the
    /// pool's own timeout elapses.
    fn acquire(&self, cancel: &Cancellation) -> Result<SqlitePooled> {
        let pool = self.pool()?;
        let give_up = Instant::now() + pool.connection_timeout();
        loop {
            cancel.check()?;
            let now = Instant::now();
            let mut slice = ACQUIRE_POLL.min(give_up.saturating_duration_since(now));
            if let Some(deadline) = cancel.deadline() {
                slice = slice.min(deadline.saturating_duration_since(now));
            }
            match pool.get_timeout(slice) {
                Ok(conn) => return Ok(conn),
                Err(e) if Instant::now() >= give_up => return Err(Error::Pool(e)),
                Err(_) => continue,
            }
        }
    }
}

fn configure_connection(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => ValueRef::Null,
            Value::Integer(v) => ValueRef::Integer(*v),
            Value::Real(v) => ValueRef::Real(*v),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

fn map_sqlite_error(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Error::NoRows,
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            Error::Constraint(msg.unwrap_or_else(|| err.to_string()))
        }
        other => Error::Database(other),
    }
}

fn is_interrupt(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::OperationInterrupted)
}

/// Runs `f` with a progress handler that interrupts the engine once
/// `cancel` fires.
fn with_cancel<T>(
    conn: &Connection,
    cancel: &Cancellation,
    f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
) -> Result<T> {
    cancel.check()?;
    let watch = cancel.clone();
    conn.progress_handler(PROGRESS_OPS, Some(move || watch.is_done()));
    let result = f(conn);
    conn.progress_handler(0, None::<fn() -> bool>);

    match result {
        Ok(v) => Ok(v),
        Err(e) if is_interrupt(&e) => Err(cancel.check().err().unwrap_or(Error::Cancelled)),
        Err(e) => Err(map_sqlite_error(e)),
    }
}

fn run_execute(
    conn: &Connection,
    cancel: &Cancellation,
    sql: &str,
    params: &[Value],
) -> Result<ExecResult> {
    debug!(sql, params = params.len(), "execute");
    with_cancel(conn, cancel, |c| {
        let mut stmt = c.prepare_cached(sql)?;
        let rows_affected = stmt.execute(params_from_iter(params.iter()))?;
        Ok(ExecResult {
            last_insert_id: c.last_insert_rowid(),
            rows_affected: rows_affected as u64,
        })
    })
}

fn run_query(
    conn: &Connection,
    cancel: &Cancellation,
    sql: &str,
    params: &[Value],
    limit: Option<usize>,
) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    debug!(sql, params = params.len(), "query");
    with_cancel(conn, cancel, |c| {
        let mut stmt = c.prepare_cached(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut out = Vec::new();
        while limit.is_none_or(|n| out.len() < n) {
            let Some(row) = rows.next()? else { break };
            let values = (0..width)
                .map(|i| row.get_ref(i).map(to_value))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            out.push(values);
        }
        Ok((columns, out))
    })
}

fn run_query_row(
    conn: &Connection,
    cancel: &Cancellation,
    sql: &str,
    params: &[Value],
) -> Result<Row> {
    let (columns, mut rows) = run_query(conn, cancel, sql, params, Some(1))?;
    let values = rows.pop().ok_or(Error::NoRows)?;
    Ok(Row::new(columns, values))
}

impl Executor for SqliteDriver {
    fn execute_ctx(
        &self,
        cancel: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult> {
        let conn = self.acquire(cancel)?;
        run_execute(&conn, cancel, sql, params)
    }

    fn query_row_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Row> {
        let conn = self.acquire(cancel)?;
        run_query_row(&conn, cancel, sql, params)
    }

    fn query_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Rows> {
        let conn = self.acquire(cancel)?;
        let (columns, rows) = run_query(&conn, cancel, sql, params, None)?;
        Ok(Rows::new(columns, rows))
    }
}

impl Driver for SqliteDriver {
    fn connect(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.is_some() {
            return Ok(());
        }

        let target = self.open_target();
        let busy_timeout_ms = self.config.busy_timeout_ms;

        // Open one connection directly so engine errors surface as-is
        // instead of through the pool's error type.
        let probe = Connection::open_with_flags(&target, OpenFlags::default())?;
        configure_connection(&probe, busy_timeout_ms)?;
        if !self.is_memory() {
            probe.pragma_update(None, "journal_mode", "WAL")?;
        }

        let manager = SqliteConnectionManager::file(&target)
            .with_flags(OpenFlags::default())
            .with_init(move |c| configure_connection(c, busy_timeout_ms));
        let pool = Pool::builder()
            .max_size(self.max_open())
            .min_idle(Some(self.max_idle()))
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)?;

        let pin = self.is_memory().then(|| Mutex::new(probe));
        *state = Some(Connected { pool, _pin: pin });

        info!(
            dsn = %self.dsn(),
            max_open = self.max_open(),
            max_idle = self.max_idle(),
            "Connected to sqlite"
        );
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.take().is_some() {
            info!(dsn = %self.dsn(), "Closed sqlite driver");
        }
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        let conn = self.acquire(&Cancellation::new())?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn begin_ctx(&self, cancel: &Cancellation) -> Result<Box<dyn Transaction>> {
        let conn = self.acquire(cancel)?;
        with_cancel(&conn, cancel, |c| c.execute_batch("BEGIN IMMEDIATE"))?;
        debug!("begin transaction");
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }

    fn driver_type(&self) -> &str {
        SQLITE_DRIVER
    }

    fn dsn(&self) -> String {
        match &self.target {
            Target::File(path) => format!("file:{}?cache=shared&mode=rwc", path.display()),
            Target::Memory(_) => "file::memory:?cache=shared".to_string(),
        }
    }

    fn migration_dsn(&self) -> String {
        match &self.target {
            Target::File(path) => {
                let path = path.to_string_lossy();
                if path.starts_with('/') {
                    format!("sqlite://{path}")
                } else {
                    format!("sqlite:///{path}")
                }
            }
            Target::Memory(_) => "sqlite3://:memory:".to_string(),
        }
    }

    fn stats(&self) -> PoolStats {
        match self.pool() {
            Ok(pool) => {
                let state = pool.state();
                PoolStats {
                    max_open: pool.max_size(),
                    open: state.connections,
                    idle: state.idle_connections,
                    in_use: state.connections - state.idle_connections,
                }
            }
            Err(_) => PoolStats {
                max_open: self.max_open(),
                ..PoolStats::default()
            },
        }
    }
}

/// Transaction pinned to one pooled connection.
///
/// `Connection` is not `Sync`, so neither is this type: a transaction can
/// move between threads but never be shared by them.
pub struct SqliteTransaction {
    conn: SqlitePooled,
    finished: bool,
}

impl SqliteTransaction {
    fn finish(&mut self, sql: &str) -> Result<()> {
        if self.finished {
            return Err(Error::TransactionClosed);
        }
        self.conn.execute_batch(sql).map_err(map_sqlite_error)?;
        self.finished = true;
        debug!(sql, "end transaction");
        Ok(())
    }

    fn live(&self) -> Result<&Connection> {
        if self.finished {
            return Err(Error::TransactionClosed);
        }
        Ok(&self.conn)
    }
}

impl Executor for SqliteTransaction {
    fn execute_ctx(
        &self,
        cancel: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult> {
        run_execute(self.live()?, cancel, sql, params)
    }

    fn query_row_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Row> {
        run_query_row(self.live()?, cancel, sql, params)
    }

    fn query_ctx(&self, cancel: &Cancellation, sql: &str, params: &[Value]) -> Result<Rows> {
        let (columns, rows) = run_query(self.live()?, cancel, sql, params, None)?;
        Ok(Rows::new(columns, rows))
    }
}

impl Transaction for SqliteTransaction {
    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!("Failed to roll back abandoned transaction: {e}");
            }
        }
    }
}

/// Registry constructor for the `sqlite` tag.
pub fn new_file_driver(config: &DriverConfig) -> Result<Box<dyn Driver>> {
    Ok(Box::new(SqliteDriver::file(config)?))
}

/// Registry constructor for the `memory` tag.
pub fn new_memory_driver(config: &DriverConfig) -> Result<Box<dyn Driver>> {
    Ok(Box::new(SqliteDriver::memory(config)))
}

#[allow(dead_code)]
fn assert_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<SqliteDriver>();
    check::<Arc<dyn Driver>>();
}
