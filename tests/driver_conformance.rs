//! Contract every `Driver` honors, checked against the SQLite backend and
//! the scriptable mock alike.

use std::time::Duration;

use devspace_store::Error;
use devspace_store::config::{DriverConfig, MEMORY_DRIVER};
use devspace_store::driver::{Cancellation, Driver, DriverRegistry, Executor, MockDriver};
use devspace_store::params;

const EMPTY_SELECT: &str = "SELECT 1 WHERE 1 = 0";

fn statements_require_connection(d: &dyn Driver) {
    assert!(matches!(d.ping(), Err(Error::NotConnected)));
    assert!(matches!(d.query(EMPTY_SELECT, params![]), Err(Error::NotConnected)));
    assert!(d.begin().is_err());

    d.connect().unwrap();
    d.connect().unwrap();
    d.ping().unwrap();

    d.close().unwrap();
    assert!(matches!(d.ping(), Err(Error::NotConnected)));
}

fn empty_results(d: &dyn Driver) {
    d.connect().unwrap();
    assert!(matches!(d.query_row(EMPTY_SELECT, params![]), Err(Error::NoRows)));
    assert_eq!(d.query(EMPTY_SELECT, params![]).unwrap().remaining(), 0);
}

fn cancellation_is_checked_first(d: &dyn Driver) {
    d.connect().unwrap();

    let cancel = Cancellation::new();
    cancel.cancel();
    assert!(matches!(
        d.execute_ctx(&cancel, EMPTY_SELECT, params![]),
        Err(Error::Cancelled)
    ));
    assert!(matches!(d.begin_ctx(&cancel), Err(Error::Cancelled)));

    let expired = Cancellation::with_timeout(Duration::ZERO);
    let err = d.query_ctx(&expired, EMPTY_SELECT, params![]).unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
    assert!(err.is_cancelled());

    d.ping().unwrap();
}

fn transactions_finish_once(d: &dyn Driver) {
    d.connect().unwrap();

    let tx = d.begin().unwrap();
    tx.query(EMPTY_SELECT, params![]).unwrap();
    tx.commit().unwrap();

    let tx = d.begin().unwrap();
    tx.rollback().unwrap();

    drop(d.begin().unwrap());
    // the connection is usable again after an abandoned transaction
    d.begin().unwrap().commit().unwrap();
    assert_eq!(d.stats().in_use, 0);
}

fn describes_itself(d: &dyn Driver) {
    assert!(!d.driver_type().is_empty());
    assert!(!d.dsn().is_empty());
    assert!(!d.migration_dsn().is_empty());
    d.connect().unwrap();
    assert!(d.stats().max_open >= 1);
}

macro_rules! conformance {
    ($($case:ident),* $(,)?) => {
        mod sqlite {
            use super::*;
            $(
                #[test]
                fn $case() {
                    let driver = DriverRegistry::builtin()
                        .create(&DriverConfig::memory())
                        .expect("memory driver");
                    super::$case(driver.as_ref());
                }
            )*
        }

        mod mock {
            use super::*;
            $(
                #[test]
                fn $case() {
                    super::$case(&MockDriver::new());
                }
            )*
        }
    };
}

conformance!(
    statements_require_connection,
    empty_results,
    cancellation_is_checked_first,
    transactions_finish_once,
    describes_itself,
);

fn mock_constructor(_: &DriverConfig) -> devspace_store::Result<Box<dyn Driver>> {
    Ok(Box::new(MockDriver::new()))
}

#[test]
fn test_registry_accepts_custom_backends() {
    let mut registry = DriverRegistry::builtin();
    registry.register("mock", mock_constructor);

    assert_eq!(registry.tags(), ["memory", "mock", "sqlite"]);
    let driver = registry
        .open(&DriverConfig {
            driver_type: "mock".into(),
            ..DriverConfig::default()
        })
        .unwrap();
    assert_eq!(driver.driver_type(), "mock");
    driver.ping().unwrap();
}

#[test]
fn test_registry_rejects_unknown_type() {
    let config = DriverConfig {
        driver_type: "postgres".into(),
        ..DriverConfig::memory()
    };
    let err = DriverRegistry::builtin().create(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: unknown driver type 'postgres'"
    );
    assert!(DriverRegistry::builtin().contains(MEMORY_DRIVER));
}
