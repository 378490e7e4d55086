//! Integration tests for the `devspace-store` diagnostics binary.
//!
//! Every test seeds its own database file inside a fresh temp directory.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::TempDir;
use devspace_store::store::{ContextStore, DataStore, HierarchyStore};
use devspace_store::testing::file_store;
use devspace_store::types::{App, Domain, Ecosystem, Workspace};
use predicates::prelude::*;
use serde_json::Value;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("devspace.db")
    }

    fn db_str(&self) -> String {
        self.db_path().to_string_lossy().to_string()
    }

    /// Creates the schema and one workspace through the library.
    fn seed(&self) {
        let store = file_store(self.db_path()).expect("bootstrap store");
        let mut eco = Ecosystem::new("acme");
        store.create_ecosystem(&mut eco).unwrap();
        let mut domain = Domain::new(eco.id, "platform");
        store.create_domain(&mut domain).unwrap();
        let mut app = App::new(domain.id, "billing", "/src/billing");
        store.create_app(&mut app).unwrap();
        let mut ws = Workspace::new(app.id, "dev", "devspace/billing:dev");
        store.create_workspace(&mut ws).unwrap();
        store.set_active_ecosystem(Some(eco.id)).unwrap();
        store.set_active_workspace(Some(ws.id)).unwrap();
        store.close().unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("devspace-store").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(["--db", &self.db_str()])
            .args(args)
            .output()
            .expect("failed to run binary");
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is json")
    }
}

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn test_dsn_reports_both_dialects() {
    let ctx = TestContext::new();
    let out = ctx.json(&["dsn"]);

    let db = ctx.db_str();
    assert_eq!(out["driver_type"], "sqlite");
    assert_eq!(out["dsn"], format!("file:{db}?cache=shared&mode=rwc"));
    assert_eq!(out["migration_dsn"], format!("sqlite://{db}"));
}

#[test]
fn test_dsn_does_not_create_the_database() {
    let ctx = TestContext::new();
    ctx.json(&["dsn"]);
    assert!(!ctx.db_path().exists());
}

#[test]
fn test_ping_creates_database_and_reports_stats() {
    let ctx = TestContext::new();
    let out = ctx.json(&["ping"]);

    assert_eq!(out["status"], "ok");
    assert_eq!(out["stats"]["max_open"], 10);
    assert!(ctx.db_path().exists());
}

#[test]
fn test_context_shows_active_selection() {
    let ctx = TestContext::new();
    ctx.seed();
    let out = ctx.json(&["context"]);

    assert_eq!(out["active_ecosystem_id"], 1);
    assert_eq!(out["active_workspace_id"], 1);
    assert!(out["active_domain_id"].is_null());
}

#[test]
fn test_workspaces_lists_hierarchy_and_root() {
    let ctx = TestContext::new();
    ctx.seed();
    let config = write_config(
        ctx.temp_dir.path(),
        "workspaces_dir = \"/srv/devspace/workspaces\"\n",
    );

    let output = ctx
        .cmd()
        .args(["--config", &config.to_string_lossy(), "--db", &ctx.db_str()])
        .args(["workspaces", "--app", "billing"])
        .output()
        .expect("failed to run binary");
    assert!(output.status.success());
    let out: Value = serde_json::from_slice(&output.stdout).unwrap();

    let rows = out.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["slug"], "acme-platform-billing-dev");
    assert_eq!(rows[0]["status"], "stopped");
    assert_eq!(
        rows[0]["root"],
        "/srv/devspace/workspaces/acme-platform-billing-dev/"
    );
}

#[test]
fn test_workspaces_filter_without_match_is_empty() {
    let ctx = TestContext::new();
    ctx.seed();
    let out = ctx.json(&["workspaces", "--ecosystem", "globex"]);
    assert_eq!(out, Value::Array(vec![]));
}

#[test]
fn test_unknown_driver_type_fails() {
    let ctx = TestContext::new();
    let config = write_config(
        ctx.temp_dir.path(),
        "[database]\ntype = \"postgres\"\npath = \"/tmp/x.db\"\n",
    );

    ctx.cmd()
        .args(["--config", &config.to_string_lossy(), "ping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown driver type 'postgres'"));
}

#[test]
fn test_missing_config_file_fails() {
    let ctx = TestContext::new();
    let missing = ctx.temp_dir.path().join("nope.toml");

    ctx.cmd()
        .args(["--config", &missing.to_string_lossy(), "dsn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
