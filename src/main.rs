use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use devspace_store::config::{Config, SQLITE_DRIVER};
use devspace_store::driver::{DriverRegistry, PoolStats};
use devspace_store::store::{ContextStore, DataStore, HierarchyStore, SqlDataStore, workspace_root};
use devspace_store::types::{Context, WorkspaceFilter};

#[derive(Parser)]
#[command(name = "devspace-store")]
#[command(about = "Inspect the devspace database", long_about = None)]
struct Cli {
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the native and migration connection strings
    Dsn,

    /// Connect, ping and print pool statistics
    Ping,

    /// Print the active context
    Context,

    /// List workspaces with their hierarchy and root directory
    Workspaces {
        #[arg(long)]
        ecosystem: Option<String>,

        #[arg(long)]
        domain: Option<String>,

        #[arg(long)]
        app: Option<String>,

        #[arg(long)]
        workspace: Option<String>,
    },
}

#[derive(Serialize)]
struct DsnOutput {
    driver_type: String,
    dsn: String,
    migration_dsn: String,
}

#[derive(Serialize)]
struct PingOutput {
    status: &'static str,
    stats: PoolStats,
}

#[derive(Serialize)]
struct WorkspaceOutput {
    ecosystem: String,
    domain: String,
    app: String,
    workspace: String,
    slug: String,
    status: String,
    root: PathBuf,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(db) = &cli.db {
        config.database.driver_type = SQLITE_DRIVER.to_string();
        config.database.path = Some(db.clone());
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("devspace_store=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let registry = DriverRegistry::builtin();

    match cli.command {
        Commands::Dsn => {
            let driver = registry.create(&config.database)?;
            print_json(&DsnOutput {
                driver_type: driver.driver_type().to_string(),
                dsn: driver.dsn(),
                migration_dsn: driver.migration_dsn(),
            })?;
        }
        Commands::Ping => {
            let driver = registry.open(&config.database)?;
            driver.ping()?;
            info!(dsn = %driver.dsn(), "Database reachable");
            print_json(&PingOutput {
                status: "ok",
                stats: driver.stats(),
            })?;
            driver.close()?;
        }
        Commands::Context => {
            let store = SqlDataStore::open(&registry, &config.database)?;
            let context: Context = store.get_context()?;
            print_json(&context)?;
            store.close()?;
        }
        Commands::Workspaces {
            ecosystem,
            domain,
            app,
            workspace,
        } => {
            let store = SqlDataStore::open(&registry, &config.database)?;
            let filter = WorkspaceFilter {
                ecosystem,
                domain,
                app,
                workspace,
            };
            let rows: Vec<WorkspaceOutput> = store
                .find_workspaces(&filter)?
                .into_iter()
                .map(|h| WorkspaceOutput {
                    root: workspace_root(&config.workspaces_dir, &h.workspace.slug),
                    ecosystem: h.ecosystem.name,
                    domain: h.domain.name,
                    app: h.app.name,
                    workspace: h.workspace.name,
                    slug: h.workspace.slug,
                    status: h.workspace.status.to_string(),
                })
                .collect();
            print_json(&rows)?;
            store.close()?;
        }
    }

    Ok(())
}
