//! `DataStore` over any [`Driver`].

mod catalog;
mod context;
mod hierarchy;
mod rows;

use std::fmt::Display;

use chrono::{DateTime, Utc};
use tracing::info;

use super::DataStore;
use crate::config::DriverConfig;
use crate::dialect::{QueryBuilder, query_builder_for};
use crate::driver::{Driver, DriverRegistry, Executor, Row, Transaction, Value};
use crate::error::{Error, Result};

/// Stateless translation of store operations into SQL.
///
/// Holds one driver and the dialect used to render timestamps and boolean
/// literals. Nothing is cached between calls.
#[derive(Debug)]
pub struct SqlDataStore {
    driver: Box<dyn Driver>,
    qb: Box<dyn QueryBuilder>,
}

impl SqlDataStore {
    /// Wraps a driver, picking the dialect from its declared type.
    pub fn new(driver: Box<dyn Driver>) -> Self {
        let qb = query_builder_for(driver.driver_type());
        Self { driver, qb }
    }

    pub fn with_query_builder(driver: Box<dyn Driver>, qb: Box<dyn QueryBuilder>) -> Self {
        Self { driver, qb }
    }

    /// Builds and connects the configured driver.
    pub fn open(registry: &DriverRegistry, config: &DriverConfig) -> Result<Self> {
        let driver = registry.open(config)?;
        info!(
            driver_type = %driver.driver_type(),
            dsn = %driver.dsn(),
            "Opened data store"
        );
        Ok(Self::new(driver))
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn query_builder(&self) -> &dyn QueryBuilder {
        self.qb.as_ref()
    }

    fn now(&self) -> &'static str {
        self.qb.now()
    }

    /// Runs `f` in a transaction, committing on success. An error drops the
    /// transaction, which rolls it back.
    fn in_tx<T>(&self, f: impl FnOnce(&dyn Transaction) -> Result<T>) -> Result<T> {
        let tx = self.driver.begin()?;
        let out = f(tx.as_ref())?;
        tx.commit()?;
        Ok(out)
    }
}

impl DataStore for SqlDataStore {
    fn ping(&self) -> Result<()> {
        self.driver.ping()
    }

    fn close(&self) -> Result<()> {
        self.driver.close()
    }
}

/// Single-row lookup with `NoRows` turned into a typed not-found.
fn fetch_one<E, T>(
    exec: &E,
    sql: &str,
    params: &[Value],
    map: fn(&Row) -> Result<T>,
    entity: &'static str,
    key: impl Display,
) -> Result<T>
where
    E: Executor + ?Sized,
{
    match exec.query_row(sql, params) {
        Ok(row) => map(&row),
        Err(Error::NoRows) => Err(Error::not_found(entity, key)),
        Err(e) => Err(e),
    }
}

fn fetch_all<E, T>(exec: &E, sql: &str, params: &[Value], map: fn(&Row) -> Result<T>) -> Result<Vec<T>>
where
    E: Executor + ?Sized,
{
    exec.query(sql, params)?.map_rows(map)
}

/// Hard delete of exactly one keyed row.
fn delete_one<E>(
    exec: &E,
    sql: &str,
    params: &[Value],
    entity: &'static str,
    key: impl Display,
) -> Result<()>
where
    E: Executor + ?Sized,
{
    let result = exec.execute(sql, params)?;
    if result.rows_affected == 0 {
        return Err(Error::not_found(entity, key));
    }
    Ok(())
}

/// Reads back `RETURNING id, created_at, updated_at`.
fn inserted(row: &Row) -> Result<(i64, DateTime<Utc>, DateTime<Utc>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

/// `a.id, a.name, ...` for a comma-separated column list.
fn qualified(alias: &str, columns: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresQueryBuilder;
    use crate::driver::mock::MockMethod;
    use crate::driver::{MockDriver, Rows};
    use crate::store::{CatalogStore, HierarchyStore};
    use crate::types::{Ecosystem, Workspace};

    fn returning_row() -> Row {
        Row::new(
            vec!["id".into(), "created_at".into(), "updated_at".into()],
            vec![
                Value::Integer(7),
                Value::Text("2024-05-01 10:00:00".into()),
                Value::Text("2024-05-01 10:00:00".into()),
            ],
        )
    }

    #[test]
    fn test_timestamp_is_interpolated_not_bound() {
        let mock = MockDriver::connected();
        mock.push_row(returning_row());
        let store = SqlDataStore::new(Box::new(mock.clone()));

        let mut eco = Ecosystem::new("acme");
        store.create_ecosystem(&mut eco).unwrap();
        assert_eq!(eco.id, 7);
        assert_eq!(eco.created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");

        let calls = mock.calls_to(MockMethod::QueryRow);
        assert!(calls[0].sql.contains("CURRENT_TIMESTAMP"));
        assert!(calls[0].params.iter().all(|p| p != &Value::Text("CURRENT_TIMESTAMP".into())));
        assert_eq!(calls[0].params[0], Value::Text("acme".into()));
    }

    #[test]
    fn test_explicit_dialect_is_used() {
        let mock = MockDriver::connected();
        let store = SqlDataStore::with_query_builder(
            Box::new(mock.clone()),
            Box::new(PostgresQueryBuilder),
        );
        assert_eq!(store.query_builder().name(), "postgres");

        store.set_default("theme", "tokyonight").unwrap();
        store.list_enabled_plugins().unwrap();

        let exec = mock.calls_to(MockMethod::Execute);
        assert!(exec[0].sql.contains("NOW()"));
        let query = mock.calls_to(MockMethod::Query);
        assert!(query[0].sql.contains("enabled = TRUE"));
    }

    #[test]
    fn test_dialect_follows_driver_type() {
        let store = SqlDataStore::new(Box::new(MockDriver::with_type("postgres")));
        assert_eq!(store.query_builder().name(), "postgres");
        let store = SqlDataStore::new(Box::new(MockDriver::new()));
        assert_eq!(store.query_builder().name(), "sqlite");
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let mock = MockDriver::connected();
        mock.fail_next(MockMethod::Query, Error::Cancelled);
        let store = SqlDataStore::new(Box::new(mock.clone()));

        let mut eco = Ecosystem::new("acme");
        eco.id = 1;
        let err = store.update_ecosystem(&eco).unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.to_string().starts_with("update ecosystem: "));
        assert_eq!(mock.commits(), 0);
        assert_eq!(mock.rollbacks(), 1);
    }

    #[test]
    fn test_workspace_slug_is_derived_inside_insert_transaction() {
        let mock = MockDriver::connected();
        mock.push_row(Row::new(
            vec!["name".into(), "name".into(), "name".into()],
            vec![
                Value::Text("acme".into()),
                Value::Text("platform".into()),
                Value::Text("billing".into()),
            ],
        ))
        .push_row(returning_row());
        let store = SqlDataStore::new(Box::new(mock.clone()));

        let mut ws = Workspace::new(3, "dev", "img");
        store.create_workspace(&mut ws).unwrap();
        assert_eq!(ws.slug, "acme-platform-billing-dev");

        let calls = mock.calls_to(MockMethod::QueryRow);
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.in_transaction));
        assert_eq!(calls[1].params[2], Value::Text("acme-platform-billing-dev".into()));
        assert_eq!(mock.commits(), 1);
    }

    #[test]
    fn test_slug_refresh_parks_rows_before_rewriting() {
        let mock = MockDriver::connected();
        let text = |s: &str| Value::Text(s.into());
        mock.push_rows(Rows::new(
            ["id", "name", "name", "name", "name"].map(String::from).to_vec(),
            vec![
                vec![Value::Integer(1), text("a-x"), text("x"), text("y"), text("z")],
                vec![Value::Integer(2), text("a-x"), text("x-x"), text("y"), text("z")],
            ],
        ));
        let store = SqlDataStore::new(Box::new(mock.clone()));

        let eco = Ecosystem {
            id: 1,
            ..Ecosystem::new("a-x")
        };
        assert_eq!(store.update_ecosystem(&eco).unwrap(), 1);

        let slug_writes: Vec<(String, Vec<Value>)> = mock
            .calls_to(MockMethod::Execute)
            .into_iter()
            .filter(|c| c.sql.starts_with("UPDATE workspaces"))
            .map(|c| (c.sql, c.params))
            .collect();
        assert_eq!(slug_writes.len(), 4);
        assert!(slug_writes[..2].iter().all(|(sql, _)| sql.contains("'~' || id")));
        assert_eq!(
            slug_writes[2].1,
            vec![text("a-x-x-y-z"), Value::Integer(1)]
        );
        assert_eq!(
            slug_writes[3].1,
            vec![text("a-x-x-x-y-z"), Value::Integer(2)]
        );
        assert_eq!(mock.commits(), 1);
    }

    #[test]
    fn test_missing_row_is_typed_not_found() {
        let store = SqlDataStore::new(Box::new(MockDriver::connected()));
        let err = store.get_ecosystem_by_name("ghost").unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { entity: "ecosystem", ref key } if key == "ghost"
        ));
    }

    #[test]
    fn test_qualified_columns() {
        assert_eq!(qualified("e", "id, name,theme"), "e.id, e.name, e.theme");
    }
}
