//! SQL fragments that differ between backend dialects.
//!
//! Timestamps are rendered as SQL expressions and interpolated into the
//! statement text, so created_at/updated_at always come from the database
//! clock.

use std::fmt::Debug;

pub trait QueryBuilder: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Current-timestamp expression.
    fn now(&self) -> &'static str;

    /// Boolean literal.
    fn boolean(&self, value: bool) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteQueryBuilder;

impl QueryBuilder for SqliteQueryBuilder {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn now(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresQueryBuilder;

impl QueryBuilder for PostgresQueryBuilder {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn now(&self) -> &'static str {
        "NOW()"
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }
}

/// Picks the builder for a driver's declared type. Unknown types get the
/// SQLite dialect.
pub fn query_builder_for(driver_type: &str) -> Box<dyn QueryBuilder> {
    match driver_type {
        "postgres" | "postgresql" | "pgx" => Box::new(PostgresQueryBuilder),
        _ => Box::new(SqliteQueryBuilder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_fragments() {
        let qb = SqliteQueryBuilder;
        assert_eq!(qb.now(), "CURRENT_TIMESTAMP");
        assert_eq!(qb.boolean(true), "1");
        assert_eq!(qb.boolean(false), "0");
    }

    #[test]
    fn test_postgres_fragments() {
        let qb = PostgresQueryBuilder;
        assert_eq!(qb.now(), "NOW()");
        assert_eq!(qb.boolean(true), "TRUE");
        assert_eq!(qb.boolean(false), "FALSE");
    }

    #[test]
    fn test_selection_by_driver_type() {
        assert_eq!(query_builder_for("sqlite").name(), "sqlite");
        assert_eq!(query_builder_for("postgres").name(), "postgres");
        assert_eq!(query_builder_for("mock").name(), "sqlite");
    }
}
