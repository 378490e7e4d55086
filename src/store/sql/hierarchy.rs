use tracing::debug;

use super::rows::{self, APP_COLUMNS, DOMAIN_COLUMNS, ECOSYSTEM_COLUMNS, WORKSPACE_COLUMNS};
use super::{SqlDataStore, delete_one, fetch_all, fetch_one, inserted, qualified};
use crate::driver::{Executor, Value};
use crate::error::{Error, Result, ResultExt};
use crate::params;
use crate::store::path::{validate_name, workspace_slug};
use crate::store::{FOREIGN_KEY_FAILED, HierarchyStore};
use crate::types::*;

const ANCESTRY_JOIN: &str = "JOIN domains d ON d.id = a.domain_id \
     JOIN ecosystems e ON e.id = d.ecosystem_id";

/// Slug for a workspace named `name` under `app_id`.
fn derive_slug<E: Executor + ?Sized>(exec: &E, app_id: i64, name: &str) -> Result<String> {
    let sql = format!("SELECT e.name, d.name, a.name FROM apps a {ANCESTRY_JOIN} WHERE a.id = ?1");
    match exec.query_row(&sql, params![app_id]) {
        Ok(row) => {
            let (eco, domain, app): (String, String, String) =
                (row.get(0)?, row.get(1)?, row.get(2)?);
            Ok(workspace_slug(&eco, &domain, &app, name))
        }
        Err(Error::NoRows) => Err(Error::Constraint(FOREIGN_KEY_FAILED.to_string())),
        Err(e) => Err(e),
    }
}

/// Re-derives the slug of every workspace matched by `scope = id`, where
/// `scope` is one of `e.id`, `d.id`, `a.id`.
fn refresh_slugs<E: Executor + ?Sized>(exec: &E, scope: &str, id: i64) -> Result<usize> {
    let sql = format!(
        "SELECT w.id, e.name, d.name, a.name, w.name FROM workspaces w \
         JOIN apps a ON a.id = w.app_id {ANCESTRY_JOIN} WHERE {scope} = ?1"
    );
    let targets = exec.query(&sql, params![id])?.map_rows(|row| {
        let slug = workspace_slug(
            &row.get::<String>(1)?,
            &row.get::<String>(2)?,
            &row.get::<String>(3)?,
            &row.get::<String>(4)?,
        );
        Ok((row.get::<i64>(0)?, slug))
    })?;

    // Park every target on a placeholder first: new slugs may equal old
    // slugs of sibling rows that have not been rewritten yet.
    for (workspace_id, _) in &targets {
        exec.execute(
            "UPDATE workspaces SET slug = '~' || id WHERE id = ?1",
            params![*workspace_id],
        )?;
    }
    for (workspace_id, slug) in &targets {
        exec.execute(
            "UPDATE workspaces SET slug = ?1 WHERE id = ?2",
            params![slug.as_str(), *workspace_id],
        )?;
    }
    debug!(scope, id, count = targets.len(), "Refreshed workspace slugs");
    Ok(targets.len())
}

impl HierarchyStore for SqlDataStore {
    // Ecosystem operations

    fn create_ecosystem(&self, ecosystem: &mut Ecosystem) -> Result<()> {
        validate_name("ecosystem", &ecosystem.name)?;
        let now = self.now();
        let sql = format!(
            "INSERT INTO ecosystems (name, description, theme, created_at, updated_at) \
             VALUES (?1, ?2, ?3, {now}, {now}) RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    ecosystem.name.as_str(),
                    ecosystem.description.as_deref(),
                    ecosystem.theme.as_deref()
                ],
            )
            .context(|| "create ecosystem".into())?;
        (ecosystem.id, ecosystem.created_at, ecosystem.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_ecosystem_by_name(&self, name: &str) -> Result<Ecosystem> {
        let sql = format!("SELECT {ECOSYSTEM_COLUMNS} FROM ecosystems WHERE name = ?1");
        fetch_one(&*self.driver, &sql, params![name], rows::ecosystem, "ecosystem", name)
            .context(|| "get ecosystem".into())
    }

    fn get_ecosystem_by_id(&self, id: i64) -> Result<Ecosystem> {
        let sql = format!("SELECT {ECOSYSTEM_COLUMNS} FROM ecosystems WHERE id = ?1");
        fetch_one(&*self.driver, &sql, params![id], rows::ecosystem, "ecosystem", id)
            .context(|| "get ecosystem".into())
    }

    fn update_ecosystem(&self, ecosystem: &Ecosystem) -> Result<u64> {
        validate_name("ecosystem", &ecosystem.name)?;
        let sql = format!(
            "UPDATE ecosystems SET name = ?1, description = ?2, theme = ?3, updated_at = {} \
             WHERE id = ?4",
            self.now()
        );
        self.in_tx(|tx| {
            let result = tx.execute(
                &sql,
                params![
                    ecosystem.name.as_str(),
                    ecosystem.description.as_deref(),
                    ecosystem.theme.as_deref(),
                    ecosystem.id
                ],
            )?;
            if result.rows_affected > 0 {
                refresh_slugs(tx, "e.id", ecosystem.id)?;
            }
            Ok(result.rows_affected)
        })
        .context(|| "update ecosystem".into())
    }

    fn delete_ecosystem(&self, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM ecosystems WHERE name = ?1",
            params![name],
            "ecosystem",
            name,
        )
        .context(|| "delete ecosystem".into())
    }

    fn list_ecosystems(&self) -> Result<Vec<Ecosystem>> {
        let sql = format!("SELECT {ECOSYSTEM_COLUMNS} FROM ecosystems ORDER BY name");
        fetch_all(&*self.driver, &sql, params![], rows::ecosystem)
            .context(|| "list ecosystems".into())
    }

    // Domain operations

    fn create_domain(&self, domain: &mut Domain) -> Result<()> {
        validate_name("domain", &domain.name)?;
        let now = self.now();
        let sql = format!(
            "INSERT INTO domains (ecosystem_id, name, description, theme, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, {now}, {now}) RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    domain.ecosystem_id,
                    domain.name.as_str(),
                    domain.description.as_deref(),
                    domain.theme.as_deref()
                ],
            )
            .context(|| "create domain".into())?;
        (domain.id, domain.created_at, domain.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_domain(&self, ecosystem_id: i64, name: &str) -> Result<Domain> {
        let sql = format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE ecosystem_id = ?1 AND name = ?2"
        );
        fetch_one(
            &*self.driver,
            &sql,
            params![ecosystem_id, name],
            rows::domain,
            "domain",
            format!("{ecosystem_id}/{name}"),
        )
        .context(|| "get domain".into())
    }

    fn get_domain_by_id(&self, id: i64) -> Result<Domain> {
        let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = ?1");
        fetch_one(&*self.driver, &sql, params![id], rows::domain, "domain", id)
            .context(|| "get domain".into())
    }

    fn update_domain(&self, domain: &Domain) -> Result<u64> {
        validate_name("domain", &domain.name)?;
        let sql = format!(
            "UPDATE domains SET ecosystem_id = ?1, name = ?2, description = ?3, theme = ?4, \
             updated_at = {} WHERE id = ?5",
            self.now()
        );
        self.in_tx(|tx| {
            let result = tx.execute(
                &sql,
                params![
                    domain.ecosystem_id,
                    domain.name.as_str(),
                    domain.description.as_deref(),
                    domain.theme.as_deref(),
                    domain.id
                ],
            )?;
            if result.rows_affected > 0 {
                refresh_slugs(tx, "d.id", domain.id)?;
            }
            Ok(result.rows_affected)
        })
        .context(|| "update domain".into())
    }

    fn delete_domain(&self, id: i64) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM domains WHERE id = ?1",
            params![id],
            "domain",
            id,
        )
        .context(|| "delete domain".into())
    }

    fn list_domains(&self, ecosystem_id: i64) -> Result<Vec<Domain>> {
        let sql =
            format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE ecosystem_id = ?1 ORDER BY name");
        fetch_all(&*self.driver, &sql, params![ecosystem_id], rows::domain)
            .context(|| "list domains".into())
    }

    fn list_all_domains(&self) -> Result<Vec<Domain>> {
        let sql = format!(
            "SELECT {} FROM domains d JOIN ecosystems e ON e.id = d.ecosystem_id \
             ORDER BY e.name, d.name",
            qualified("d", DOMAIN_COLUMNS)
        );
        fetch_all(&*self.driver, &sql, params![], rows::domain).context(|| "list domains".into())
    }

    // App operations

    fn create_app(&self, app: &mut App) -> Result<()> {
        validate_name("app", &app.name)?;
        let now = self.now();
        let sql = format!(
            "INSERT INTO apps (domain_id, name, path, description, language, build_config, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, {now}, {now}) RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    app.domain_id,
                    app.name.as_str(),
                    app.path.as_str(),
                    app.description.as_deref(),
                    app.language.as_deref(),
                    app.build_config.as_deref()
                ],
            )
            .context(|| "create app".into())?;
        (app.id, app.created_at, app.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_app(&self, domain_id: i64, name: &str) -> Result<App> {
        let sql = format!("SELECT {APP_COLUMNS} FROM apps WHERE domain_id = ?1 AND name = ?2");
        fetch_one(
            &*self.driver,
            &sql,
            params![domain_id, name],
            rows::app,
            "app",
            format!("{domain_id}/{name}"),
        )
        .context(|| "get app".into())
    }

    fn get_app_by_id(&self, id: i64) -> Result<App> {
        let sql = format!("SELECT {APP_COLUMNS} FROM apps WHERE id = ?1");
        fetch_one(&*self.driver, &sql, params![id], rows::app, "app", id)
            .context(|| "get app".into())
    }

    fn update_app(&self, app: &App) -> Result<u64> {
        validate_name("app", &app.name)?;
        let sql = format!(
            "UPDATE apps SET domain_id = ?1, name = ?2, path = ?3, description = ?4, \
             language = ?5, build_config = ?6, updated_at = {} WHERE id = ?7",
            self.now()
        );
        self.in_tx(|tx| {
            let result = tx.execute(
                &sql,
                params![
                    app.domain_id,
                    app.name.as_str(),
                    app.path.as_str(),
                    app.description.as_deref(),
                    app.language.as_deref(),
                    app.build_config.as_deref(),
                    app.id
                ],
            )?;
            if result.rows_affected > 0 {
                refresh_slugs(tx, "a.id", app.id)?;
            }
            Ok(result.rows_affected)
        })
        .context(|| "update app".into())
    }

    fn delete_app(&self, id: i64) -> Result<()> {
        delete_one(&*self.driver, "DELETE FROM apps WHERE id = ?1", params![id], "app", id)
            .context(|| "delete app".into())
    }

    fn list_apps(&self, domain_id: i64) -> Result<Vec<App>> {
        let sql = format!("SELECT {APP_COLUMNS} FROM apps WHERE domain_id = ?1 ORDER BY name");
        fetch_all(&*self.driver, &sql, params![domain_id], rows::app)
            .context(|| "list apps".into())
    }

    fn list_all_apps(&self) -> Result<Vec<App>> {
        let sql = format!(
            "SELECT {} FROM apps a {ANCESTRY_JOIN} ORDER BY e.name, d.name, a.name",
            qualified("a", APP_COLUMNS)
        );
        fetch_all(&*self.driver, &sql, params![], rows::app).context(|| "list apps".into())
    }

    fn find_apps_by_name(&self, name: &str) -> Result<Vec<AppWithHierarchy>> {
        let sql = format!(
            "SELECT {}, {}, {} FROM apps a {ANCESTRY_JOIN} WHERE a.name = ?1 \
             ORDER BY e.name, d.name",
            qualified("a", APP_COLUMNS),
            qualified("d", DOMAIN_COLUMNS),
            qualified("e", ECOSYSTEM_COLUMNS)
        );
        fetch_all(&*self.driver, &sql, params![name], rows::app_with_hierarchy)
            .context(|| "find apps".into())
    }

    // Workspace operations

    fn create_workspace(&self, workspace: &mut Workspace) -> Result<()> {
        validate_name("workspace", &workspace.name)?;
        let now = self.now();
        let sql = format!(
            "INSERT INTO workspaces (app_id, name, slug, description, image_name, container_id, \
             status, nvim_structure, nvim_plugins, ssh_agent_forwarding, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let (row, slug) = self
            .in_tx(|tx| {
                let slug = derive_slug(tx, workspace.app_id, &workspace.name)?;
                let row = tx.query_row(
                    &sql,
                    params![
                        workspace.app_id,
                        workspace.name.as_str(),
                        slug.as_str(),
                        workspace.description.as_deref(),
                        workspace.image_name.as_str(),
                        workspace.container_id.as_deref(),
                        workspace.status,
                        workspace.nvim_structure.as_deref(),
                        workspace.nvim_plugins.as_deref(),
                        workspace.ssh_agent_forwarding
                    ],
                )?;
                Ok((row, slug))
            })
            .context(|| "create workspace".into())?;
        (workspace.id, workspace.created_at, workspace.updated_at) = inserted(&row)?;
        workspace.slug = slug;
        Ok(())
    }

    fn get_workspace(&self, app_id: i64, name: &str) -> Result<Workspace> {
        let sql =
            format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE app_id = ?1 AND name = ?2");
        fetch_one(
            &*self.driver,
            &sql,
            params![app_id, name],
            rows::workspace,
            "workspace",
            format!("{app_id}/{name}"),
        )
        .context(|| "get workspace".into())
    }

    fn get_workspace_by_id(&self, id: i64) -> Result<Workspace> {
        let sql = format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = ?1");
        fetch_one(&*self.driver, &sql, params![id], rows::workspace, "workspace", id)
            .context(|| "get workspace".into())
    }

    fn get_workspace_by_slug(&self, slug: &str) -> Result<Workspace> {
        let sql = format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE slug = ?1");
        fetch_one(&*self.driver, &sql, params![slug], rows::workspace, "workspace", slug)
            .context(|| "get workspace".into())
    }

    fn update_workspace(&self, workspace: &Workspace) -> Result<u64> {
        validate_name("workspace", &workspace.name)?;
        let sql = format!(
            "UPDATE workspaces SET app_id = ?1, name = ?2, slug = ?3, description = ?4, \
             image_name = ?5, container_id = ?6, status = ?7, nvim_structure = ?8, \
             nvim_plugins = ?9, ssh_agent_forwarding = ?10, updated_at = {} WHERE id = ?11",
            self.now()
        );
        self.in_tx(|tx| {
            let slug = derive_slug(tx, workspace.app_id, &workspace.name)?;
            let result = tx.execute(
                &sql,
                params![
                    workspace.app_id,
                    workspace.name.as_str(),
                    slug.as_str(),
                    workspace.description.as_deref(),
                    workspace.image_name.as_str(),
                    workspace.container_id.as_deref(),
                    workspace.status,
                    workspace.nvim_structure.as_deref(),
                    workspace.nvim_plugins.as_deref(),
                    workspace.ssh_agent_forwarding,
                    workspace.id
                ],
            )?;
            Ok(result.rows_affected)
        })
        .context(|| "update workspace".into())
    }

    fn delete_workspace(&self, id: i64) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM workspaces WHERE id = ?1",
            params![id],
            "workspace",
            id,
        )
        .context(|| "delete workspace".into())
    }

    fn list_workspaces(&self, app_id: i64) -> Result<Vec<Workspace>> {
        let sql =
            format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE app_id = ?1 ORDER BY name");
        fetch_all(&*self.driver, &sql, params![app_id], rows::workspace)
            .context(|| "list workspaces".into())
    }

    fn list_all_workspaces(&self) -> Result<Vec<Workspace>> {
        let sql = format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces ORDER BY slug");
        fetch_all(&*self.driver, &sql, params![], rows::workspace)
            .context(|| "list workspaces".into())
    }

    fn find_workspaces(&self, filter: &WorkspaceFilter) -> Result<Vec<WorkspaceWithHierarchy>> {
        let mut sql = format!(
            "SELECT {}, {}, {}, {} FROM workspaces w JOIN apps a ON a.id = w.app_id \
             {ANCESTRY_JOIN} WHERE 1 = 1",
            qualified("w", WORKSPACE_COLUMNS),
            qualified("a", APP_COLUMNS),
            qualified("d", DOMAIN_COLUMNS),
            qualified("e", ECOSYSTEM_COLUMNS)
        );
        let mut args: Vec<Value> = Vec::new();
        for (column, wanted) in [
            ("e.name", &filter.ecosystem),
            ("d.name", &filter.domain),
            ("a.name", &filter.app),
            ("w.name", &filter.workspace),
        ] {
            if let Some(name) = wanted.as_deref().filter(|n| !n.is_empty()) {
                args.push(name.into());
                sql.push_str(&format!(" AND {column} = ?{}", args.len()));
            }
        }
        sql.push_str(" ORDER BY e.name, d.name, a.name, w.name");

        fetch_all(&*self.driver, &sql, &args, rows::workspace_with_hierarchy)
            .context(|| "find workspaces".into())
    }
}
