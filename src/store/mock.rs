//! In-memory `DataStore` for tests of code that sits above the store.
//!
//! Tables are plain maps behind one mutex. The mock reproduces what callers
//! can observe from the SQL store: engine-assigned ids per table, name
//! ordering, uniqueness and foreign-key failures carrying SQLite's
//! messages, slug derivation and refresh, and the not-found rules. Every
//! call is recorded by operation name and failures can be scripted with
//! [`MockDataStore::fail_next`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SubsecRound, Utc};

use super::path::{validate_name, workspace_slug};
use super::{CatalogStore, ContextStore, DataStore, FOREIGN_KEY_FAILED, HierarchyStore};
use crate::error::{Error, Result};
use crate::types::*;

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn unique_failed(columns: &str) -> Error {
    Error::Constraint(format!("UNIQUE constraint failed: {columns}"))
}

fn foreign_key_failed() -> Error {
    Error::Constraint(FOREIGN_KEY_FAILED.to_string())
}

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<&T> {
        self.rows.values().find(|row| pred(row))
    }

    fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.rows.values().any(pred)
    }

    fn collect(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| pred(row)).cloned().collect()
    }
}

/// Name-keyed catalog rows.
trait CatalogRow: Clone {
    const TABLE: &'static str;
    const ENTITY: &'static str;

    fn id(&self) -> i64;
    fn name(&self) -> &str;
    fn stamp(&mut self, id: i64, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! catalog_row {
    ($($ty:ty => $table:literal, $entity:literal;)*) => {$(
        impl CatalogRow for $ty {
            const TABLE: &'static str = $table;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> i64 {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn stamp(&mut self, id: i64, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
                self.id = id;
                self.created_at = created_at;
                self.updated_at = updated_at;
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    )*};
}

catalog_row! {
    Plugin => "plugins", "plugin";
    Theme => "themes", "theme";
    Prompt => "prompts", "prompt";
    Profile => "profiles", "profile";
    Emulator => "emulators", "emulator";
    Package => "packages", "package";
}

impl<T: CatalogRow> Table<T> {
    fn create_named(&mut self, value: &mut T) -> Result<()> {
        if self.any(|row| row.name() == value.name()) {
            return Err(unique_failed(&format!("{}.name", T::TABLE)));
        }
        let id = self.next_id();
        let ts = now();
        value.stamp(id, ts, ts);
        self.rows.insert(id, value.clone());
        Ok(())
    }

    fn get_named(&self, name: &str) -> Result<T> {
        self.find(|row| row.name() == name)
            .cloned()
            .ok_or_else(|| Error::not_found(T::ENTITY, name))
    }

    fn update_named(&mut self, value: &T) -> Result<u64> {
        let Some(existing) = self.get(value.id()) else {
            return Ok(0);
        };
        let created_at = existing.created_at();
        if self.any(|row| row.id() != value.id() && row.name() == value.name()) {
            return Err(unique_failed(&format!("{}.name", T::TABLE)));
        }
        let mut stored = value.clone();
        stored.stamp(value.id(), created_at, now());
        self.rows.insert(value.id(), stored);
        Ok(1)
    }

    fn upsert_named(&mut self, value: &mut T) -> Result<()> {
        match self.find(|row| row.name() == value.name()).map(CatalogRow::id) {
            Some(id) => {
                let created_at = self.get(id).map(CatalogRow::created_at).unwrap_or_default();
                value.stamp(id, created_at, now());
                self.rows.insert(id, value.clone());
                Ok(())
            }
            None => self.create_named(value),
        }
    }

    fn delete_named(&mut self, name: &str) -> Result<i64> {
        let id = self
            .find(|row| row.name() == name)
            .map(CatalogRow::id)
            .ok_or_else(|| Error::not_found(T::ENTITY, name))?;
        self.rows.remove(&id);
        Ok(id)
    }

    fn list_named(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows = self.collect(pred);
        rows.sort_by(|a, b| a.name().cmp(b.name()));
        rows
    }
}

#[derive(Debug)]
struct MockState {
    ecosystems: Table<Ecosystem>,
    domains: Table<Domain>,
    apps: Table<App>,
    workspaces: Table<Workspace>,
    context: Context,
    plugins: Table<Plugin>,
    themes: Table<Theme>,
    prompts: Table<Prompt>,
    profiles: Table<Profile>,
    emulators: Table<Emulator>,
    packages: Table<Package>,
    credentials: Table<Credential>,
    defaults: BTreeMap<String, DefaultEntry>,
    workspace_plugins: BTreeMap<(i64, i64), bool>,
    closed: bool,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, VecDeque<Error>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            ecosystems: Table::default(),
            domains: Table::default(),
            apps: Table::default(),
            workspaces: Table::default(),
            context: Context {
                updated_at: now(),
                ..Context::default()
            },
            plugins: Table::default(),
            themes: Table::default(),
            prompts: Table::default(),
            profiles: Table::default(),
            emulators: Table::default(),
            packages: Table::default(),
            credentials: Table::default(),
            defaults: BTreeMap::new(),
            workspace_plugins: BTreeMap::new(),
            closed: false,
            calls: Vec::new(),
            failures: HashMap::new(),
        }
    }

    fn ancestry_of_app(&self, app_id: i64) -> Option<(&Ecosystem, &Domain, &App)> {
        let app = self.apps.get(app_id)?;
        let domain = self.domains.get(app.domain_id)?;
        let ecosystem = self.ecosystems.get(domain.ecosystem_id)?;
        Some((ecosystem, domain, app))
    }

    fn slug_for(&self, app_id: i64, name: &str) -> Result<String> {
        let (e, d, a) = self.ancestry_of_app(app_id).ok_or_else(foreign_key_failed)?;
        Ok(workspace_slug(&e.name, &d.name, &a.name, name))
    }

    /// Re-derives every slug. Only renames change slugs, so recomputing the
    /// whole table yields the same result as a scoped refresh.
    fn refresh_slugs(&mut self) -> Result<()> {
        let mut slugs = Vec::with_capacity(self.workspaces.rows.len());
        for ws in self.workspaces.rows.values() {
            slugs.push((ws.id, self.slug_for(ws.app_id, &ws.name)?));
        }
        let mut seen = std::collections::HashSet::new();
        if !slugs.iter().all(|(_, slug)| seen.insert(slug.as_str())) {
            return Err(unique_failed("workspaces.slug"));
        }
        for (id, slug) in slugs {
            if let Some(ws) = self.workspaces.rows.get_mut(&id) {
                ws.slug = slug;
            }
        }
        Ok(())
    }

    fn hierarchy_of(&self, ws: &Workspace) -> Option<WorkspaceWithHierarchy> {
        let (e, d, a) = self.ancestry_of_app(ws.app_id)?;
        Some(WorkspaceWithHierarchy {
            workspace: ws.clone(),
            app: a.clone(),
            domain: d.clone(),
            ecosystem: e.clone(),
        })
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug)]
pub struct MockDataStore {
    state: Mutex<MockState>,
}

impl Default for MockDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::new()),
        }
    }

    /// Makes the next call of operation `op` (the trait method name, e.g.
    /// `"create_workspace"`) fail with `err`.
    pub fn fail_next(&self, op: &'static str, err: Error) -> &Self {
        lock(&self.state)
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
        self
    }

    /// Operation names in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.state).calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        lock(&self.state).calls.iter().filter(|c| **c == op).count()
    }

    /// Records `op`, then applies the closed state and scripted failures.
    fn enter(&self, op: &'static str) -> Result<MutexGuard<'_, MockState>> {
        let mut state = lock(&self.state);
        state.calls.push(op);
        if let Some(err) = state.failures.get_mut(op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if state.closed {
            return Err(Error::NotConnected);
        }
        Ok(state)
    }
}

impl DataStore for MockDataStore {
    fn ping(&self) -> Result<()> {
        self.enter("ping").map(drop)
    }

    fn close(&self) -> Result<()> {
        self.enter("close")?.closed = true;
        Ok(())
    }
}

impl HierarchyStore for MockDataStore {
    // Ecosystem operations

    fn create_ecosystem(&self, ecosystem: &mut Ecosystem) -> Result<()> {
        validate_name("ecosystem", &ecosystem.name)?;
        let mut state = self.enter("create_ecosystem")?;
        if state.ecosystems.any(|e| e.name == ecosystem.name) {
            return Err(unique_failed("ecosystems.name"));
        }
        let ts = now();
        ecosystem.id = state.ecosystems.next_id();
        ecosystem.created_at = ts;
        ecosystem.updated_at = ts;
        state.ecosystems.rows.insert(ecosystem.id, ecosystem.clone());
        Ok(())
    }

    fn get_ecosystem_by_name(&self, name: &str) -> Result<Ecosystem> {
        let state = self.enter("get_ecosystem_by_name")?;
        state
            .ecosystems
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("ecosystem", name))
    }

    fn get_ecosystem_by_id(&self, id: i64) -> Result<Ecosystem> {
        let state = self.enter("get_ecosystem_by_id")?;
        state
            .ecosystems
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("ecosystem", id))
    }

    fn update_ecosystem(&self, ecosystem: &Ecosystem) -> Result<u64> {
        validate_name("ecosystem", &ecosystem.name)?;
        let mut state = self.enter("update_ecosystem")?;
        let Some(existing) = state.ecosystems.get(ecosystem.id).cloned() else {
            return Ok(0);
        };
        if state
            .ecosystems
            .any(|e| e.id != ecosystem.id && e.name == ecosystem.name)
        {
            return Err(unique_failed("ecosystems.name"));
        }
        let updated = Ecosystem {
            created_at: existing.created_at,
            updated_at: now(),
            ..ecosystem.clone()
        };
        state.ecosystems.rows.insert(ecosystem.id, updated);
        if let Err(e) = state.refresh_slugs() {
            state.ecosystems.rows.insert(existing.id, existing);
            return Err(e);
        }
        Ok(1)
    }

    fn delete_ecosystem(&self, name: &str) -> Result<()> {
        let mut state = self.enter("delete_ecosystem")?;
        let id = state
            .ecosystems
            .find(|e| e.name == name)
            .map(|e| e.id)
            .ok_or_else(|| Error::not_found("ecosystem", name))?;
        if state.domains.any(|d| d.ecosystem_id == id) {
            return Err(foreign_key_failed());
        }
        state.ecosystems.rows.remove(&id);
        Ok(())
    }

    fn list_ecosystems(&self) -> Result<Vec<Ecosystem>> {
        let state = self.enter("list_ecosystems")?;
        let mut rows = state.ecosystems.collect(|_| true);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    // Domain operations

    fn create_domain(&self, domain: &mut Domain) -> Result<()> {
        validate_name("domain", &domain.name)?;
        let mut state = self.enter("create_domain")?;
        if state
            .domains
            .any(|d| d.ecosystem_id == domain.ecosystem_id && d.name == domain.name)
        {
            return Err(unique_failed("domains.ecosystem_id, domains.name"));
        }
        if !state.ecosystems.contains(domain.ecosystem_id) {
            return Err(foreign_key_failed());
        }
        let ts = now();
        domain.id = state.domains.next_id();
        domain.created_at = ts;
        domain.updated_at = ts;
        state.domains.rows.insert(domain.id, domain.clone());
        Ok(())
    }

    fn get_domain(&self, ecosystem_id: i64, name: &str) -> Result<Domain> {
        let state = self.enter("get_domain")?;
        state
            .domains
            .find(|d| d.ecosystem_id == ecosystem_id && d.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("domain", format!("{ecosystem_id}/{name}")))
    }

    fn get_domain_by_id(&self, id: i64) -> Result<Domain> {
        let state = self.enter("get_domain_by_id")?;
        state
            .domains
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("domain", id))
    }

    fn update_domain(&self, domain: &Domain) -> Result<u64> {
        validate_name("domain", &domain.name)?;
        let mut state = self.enter("update_domain")?;
        let Some(existing) = state.domains.get(domain.id).cloned() else {
            return Ok(0);
        };
        if state.domains.any(|d| {
            d.id != domain.id && d.ecosystem_id == domain.ecosystem_id && d.name == domain.name
        }) {
            return Err(unique_failed("domains.ecosystem_id, domains.name"));
        }
        if !state.ecosystems.contains(domain.ecosystem_id) {
            return Err(foreign_key_failed());
        }
        let updated = Domain {
            created_at: existing.created_at,
            updated_at: now(),
            ..domain.clone()
        };
        state.domains.rows.insert(domain.id, updated);
        if let Err(e) = state.refresh_slugs() {
            state.domains.rows.insert(existing.id, existing);
            return Err(e);
        }
        Ok(1)
    }

    fn delete_domain(&self, id: i64) -> Result<()> {
        let mut state = self.enter("delete_domain")?;
        if !state.domains.contains(id) {
            return Err(Error::not_found("domain", id));
        }
        if state.apps.any(|a| a.domain_id == id) {
            return Err(foreign_key_failed());
        }
        state.domains.rows.remove(&id);
        Ok(())
    }

    fn list_domains(&self, ecosystem_id: i64) -> Result<Vec<Domain>> {
        let state = self.enter("list_domains")?;
        let mut rows = state.domains.collect(|d| d.ecosystem_id == ecosystem_id);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn list_all_domains(&self) -> Result<Vec<Domain>> {
        let state = self.enter("list_all_domains")?;
        let mut rows: Vec<(String, Domain)> = state
            .domains
            .rows
            .values()
            .filter_map(|d| {
                let eco = state.ecosystems.get(d.ecosystem_id)?;
                Some((eco.name.clone(), d.clone()))
            })
            .collect();
        rows.sort_by(|a, b| (&a.0, &a.1.name).cmp(&(&b.0, &b.1.name)));
        Ok(rows.into_iter().map(|(_, d)| d).collect())
    }

    // App operations

    fn create_app(&self, app: &mut App) -> Result<()> {
        validate_name("app", &app.name)?;
        let mut state = self.enter("create_app")?;
        if state
            .apps
            .any(|a| a.domain_id == app.domain_id && a.name == app.name)
        {
            return Err(unique_failed("apps.domain_id, apps.name"));
        }
        if !state.domains.contains(app.domain_id) {
            return Err(foreign_key_failed());
        }
        let ts = now();
        app.id = state.apps.next_id();
        app.created_at = ts;
        app.updated_at = ts;
        state.apps.rows.insert(app.id, app.clone());
        Ok(())
    }

    fn get_app(&self, domain_id: i64, name: &str) -> Result<App> {
        let state = self.enter("get_app")?;
        state
            .apps
            .find(|a| a.domain_id == domain_id && a.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("app", format!("{domain_id}/{name}")))
    }

    fn get_app_by_id(&self, id: i64) -> Result<App> {
        let state = self.enter("get_app_by_id")?;
        state
            .apps
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("app", id))
    }

    fn update_app(&self, app: &App) -> Result<u64> {
        validate_name("app", &app.name)?;
        let mut state = self.enter("update_app")?;
        let Some(existing) = state.apps.get(app.id).cloned() else {
            return Ok(0);
        };
        if state
            .apps
            .any(|a| a.id != app.id && a.domain_id == app.domain_id && a.name == app.name)
        {
            return Err(unique_failed("apps.domain_id, apps.name"));
        }
        if !state.domains.contains(app.domain_id) {
            return Err(foreign_key_failed());
        }
        let updated = App {
            created_at: existing.created_at,
            updated_at: now(),
            ..app.clone()
        };
        state.apps.rows.insert(app.id, updated);
        if let Err(e) = state.refresh_slugs() {
            state.apps.rows.insert(existing.id, existing);
            return Err(e);
        }
        Ok(1)
    }

    fn delete_app(&self, id: i64) -> Result<()> {
        let mut state = self.enter("delete_app")?;
        if !state.apps.contains(id) {
            return Err(Error::not_found("app", id));
        }
        if state.workspaces.any(|w| w.app_id == id) {
            return Err(foreign_key_failed());
        }
        state.apps.rows.remove(&id);
        Ok(())
    }

    fn list_apps(&self, domain_id: i64) -> Result<Vec<App>> {
        let state = self.enter("list_apps")?;
        let mut rows = state.apps.collect(|a| a.domain_id == domain_id);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn list_all_apps(&self) -> Result<Vec<App>> {
        let state = self.enter("list_all_apps")?;
        let mut rows: Vec<(String, String, App)> = state
            .apps
            .rows
            .values()
            .filter_map(|a| {
                let (e, d, a) = state.ancestry_of_app(a.id)?;
                Some((e.name.clone(), d.name.clone(), a.clone()))
            })
            .collect();
        rows.sort_by(|x, y| (&x.0, &x.1, &x.2.name).cmp(&(&y.0, &y.1, &y.2.name)));
        Ok(rows.into_iter().map(|(_, _, a)| a).collect())
    }

    fn find_apps_by_name(&self, name: &str) -> Result<Vec<AppWithHierarchy>> {
        let state = self.enter("find_apps_by_name")?;
        let mut rows: Vec<AppWithHierarchy> = state
            .apps
            .rows
            .values()
            .filter(|a| a.name == name)
            .filter_map(|a| {
                let (e, d, a) = state.ancestry_of_app(a.id)?;
                Some(AppWithHierarchy {
                    app: a.clone(),
                    domain: d.clone(),
                    ecosystem: e.clone(),
                })
            })
            .collect();
        rows.sort_by(|x, y| {
            (&x.ecosystem.name, &x.domain.name).cmp(&(&y.ecosystem.name, &y.domain.name))
        });
        Ok(rows)
    }

    // Workspace operations

    fn create_workspace(&self, workspace: &mut Workspace) -> Result<()> {
        validate_name("workspace", &workspace.name)?;
        let mut state = self.enter("create_workspace")?;
        let slug = state.slug_for(workspace.app_id, &workspace.name)?;
        if state.workspaces.any(|w| w.slug == slug) {
            return Err(unique_failed("workspaces.slug"));
        }
        if state
            .workspaces
            .any(|w| w.app_id == workspace.app_id && w.name == workspace.name)
        {
            return Err(unique_failed("workspaces.app_id, workspaces.name"));
        }
        let ts = now();
        workspace.id = state.workspaces.next_id();
        workspace.slug = slug;
        workspace.created_at = ts;
        workspace.updated_at = ts;
        state.workspaces.rows.insert(workspace.id, workspace.clone());
        Ok(())
    }

    fn get_workspace(&self, app_id: i64, name: &str) -> Result<Workspace> {
        let state = self.enter("get_workspace")?;
        state
            .workspaces
            .find(|w| w.app_id == app_id && w.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("workspace", format!("{app_id}/{name}")))
    }

    fn get_workspace_by_id(&self, id: i64) -> Result<Workspace> {
        let state = self.enter("get_workspace_by_id")?;
        state
            .workspaces
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("workspace", id))
    }

    fn get_workspace_by_slug(&self, slug: &str) -> Result<Workspace> {
        let state = self.enter("get_workspace_by_slug")?;
        state
            .workspaces
            .find(|w| w.slug == slug)
            .cloned()
            .ok_or_else(|| Error::not_found("workspace", slug))
    }

    fn update_workspace(&self, workspace: &Workspace) -> Result<u64> {
        validate_name("workspace", &workspace.name)?;
        let mut state = self.enter("update_workspace")?;
        let slug = state.slug_for(workspace.app_id, &workspace.name)?;
        let Some(existing) = state.workspaces.get(workspace.id).cloned() else {
            return Ok(0);
        };
        if state
            .workspaces
            .any(|w| w.id != workspace.id && w.slug == slug)
        {
            return Err(unique_failed("workspaces.slug"));
        }
        if state.workspaces.any(|w| {
            w.id != workspace.id && w.app_id == workspace.app_id && w.name == workspace.name
        }) {
            return Err(unique_failed("workspaces.app_id, workspaces.name"));
        }
        let updated = Workspace {
            slug,
            created_at: existing.created_at,
            updated_at: now(),
            ..workspace.clone()
        };
        state.workspaces.rows.insert(workspace.id, updated);
        Ok(1)
    }

    fn delete_workspace(&self, id: i64) -> Result<()> {
        let mut state = self.enter("delete_workspace")?;
        if state.workspaces.rows.remove(&id).is_none() {
            return Err(Error::not_found("workspace", id));
        }
        state.workspace_plugins.retain(|(ws, _), _| *ws != id);
        Ok(())
    }

    fn list_workspaces(&self, app_id: i64) -> Result<Vec<Workspace>> {
        let state = self.enter("list_workspaces")?;
        let mut rows = state.workspaces.collect(|w| w.app_id == app_id);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn list_all_workspaces(&self) -> Result<Vec<Workspace>> {
        let state = self.enter("list_all_workspaces")?;
        let mut rows = state.workspaces.collect(|_| true);
        rows.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(rows)
    }

    fn find_workspaces(&self, filter: &WorkspaceFilter) -> Result<Vec<WorkspaceWithHierarchy>> {
        let state = self.enter("find_workspaces")?;
        let wanted = |field: &Option<String>, actual: &str| match field.as_deref() {
            Some(name) if !name.is_empty() => name == actual,
            _ => true,
        };
        let mut rows: Vec<WorkspaceWithHierarchy> = state
            .workspaces
            .rows
            .values()
            .filter_map(|w| state.hierarchy_of(w))
            .filter(|h| {
                wanted(&filter.ecosystem, &h.ecosystem.name)
                    && wanted(&filter.domain, &h.domain.name)
                    && wanted(&filter.app, &h.app.name)
                    && wanted(&filter.workspace, &h.workspace.name)
            })
            .collect();
        rows.sort_by(|x, y| {
            (
                &x.ecosystem.name,
                &x.domain.name,
                &x.app.name,
                &x.workspace.name,
            )
                .cmp(&(
                    &y.ecosystem.name,
                    &y.domain.name,
                    &y.app.name,
                    &y.workspace.name,
                ))
        });
        Ok(rows)
    }
}

impl ContextStore for MockDataStore {
    fn get_context(&self) -> Result<Context> {
        Ok(self.enter("get_context")?.context.clone())
    }

    fn set_active_ecosystem(&self, id: Option<i64>) -> Result<()> {
        let mut state = self.enter("set_active_ecosystem")?;
        state.context.active_ecosystem_id = id;
        state.context.updated_at = now();
        Ok(())
    }

    fn set_active_domain(&self, id: Option<i64>) -> Result<()> {
        let mut state = self.enter("set_active_domain")?;
        state.context.active_domain_id = id;
        state.context.updated_at = now();
        Ok(())
    }

    fn set_active_app(&self, id: Option<i64>) -> Result<()> {
        let mut state = self.enter("set_active_app")?;
        state.context.active_app_id = id;
        state.context.updated_at = now();
        Ok(())
    }

    fn set_active_workspace(&self, id: Option<i64>) -> Result<()> {
        let mut state = self.enter("set_active_workspace")?;
        state.context.active_workspace_id = id;
        state.context.updated_at = now();
        Ok(())
    }

    fn set_active_project(&self, id: Option<i64>) -> Result<()> {
        let mut state = self.enter("set_active_project")?;
        state.context.active_project_id = id;
        state.context.updated_at = now();
        Ok(())
    }
}

impl CatalogStore for MockDataStore {
    // Plugin operations

    fn create_plugin(&self, plugin: &mut Plugin) -> Result<()> {
        self.enter("create_plugin")?.plugins.create_named(plugin)
    }

    fn get_plugin_by_name(&self, name: &str) -> Result<Plugin> {
        self.enter("get_plugin_by_name")?.plugins.get_named(name)
    }

    fn get_plugin_by_id(&self, id: i64) -> Result<Plugin> {
        self.enter("get_plugin_by_id")?
            .plugins
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("plugin", id))
    }

    fn update_plugin(&self, plugin: &Plugin) -> Result<u64> {
        self.enter("update_plugin")?.plugins.update_named(plugin)
    }

    fn upsert_plugin(&self, plugin: &mut Plugin) -> Result<()> {
        self.enter("upsert_plugin")?.plugins.upsert_named(plugin)
    }

    fn delete_plugin(&self, name: &str) -> Result<()> {
        let mut state = self.enter("delete_plugin")?;
        let id = state.plugins.delete_named(name)?;
        state.workspace_plugins.retain(|(_, plugin), _| *plugin != id);
        Ok(())
    }

    fn list_plugins(&self) -> Result<Vec<Plugin>> {
        Ok(self.enter("list_plugins")?.plugins.list_named(|_| true))
    }

    fn list_plugins_by_category(&self, category: &str) -> Result<Vec<Plugin>> {
        Ok(self
            .enter("list_plugins_by_category")?
            .plugins
            .list_named(|p| p.category.as_deref() == Some(category)))
    }

    fn list_enabled_plugins(&self) -> Result<Vec<Plugin>> {
        Ok(self
            .enter("list_enabled_plugins")?
            .plugins
            .list_named(|p| p.enabled))
    }

    // Theme operations

    fn create_theme(&self, theme: &mut Theme) -> Result<()> {
        self.enter("create_theme")?.themes.create_named(theme)
    }

    fn get_theme(&self, name: &str) -> Result<Theme> {
        self.enter("get_theme")?.themes.get_named(name)
    }

    fn update_theme(&self, theme: &Theme) -> Result<u64> {
        self.enter("update_theme")?.themes.update_named(theme)
    }

    fn upsert_theme(&self, theme: &mut Theme) -> Result<()> {
        self.enter("upsert_theme")?.themes.upsert_named(theme)
    }

    fn delete_theme(&self, name: &str) -> Result<()> {
        self.enter("delete_theme")?.themes.delete_named(name).map(drop)
    }

    fn list_themes(&self) -> Result<Vec<Theme>> {
        Ok(self.enter("list_themes")?.themes.list_named(|_| true))
    }

    // Prompt operations

    fn create_prompt(&self, prompt: &mut Prompt) -> Result<()> {
        self.enter("create_prompt")?.prompts.create_named(prompt)
    }

    fn get_prompt(&self, name: &str) -> Result<Prompt> {
        self.enter("get_prompt")?.prompts.get_named(name)
    }

    fn update_prompt(&self, prompt: &Prompt) -> Result<u64> {
        self.enter("update_prompt")?.prompts.update_named(prompt)
    }

    fn upsert_prompt(&self, prompt: &mut Prompt) -> Result<()> {
        self.enter("upsert_prompt")?.prompts.upsert_named(prompt)
    }

    fn delete_prompt(&self, name: &str) -> Result<()> {
        self.enter("delete_prompt")?.prompts.delete_named(name).map(drop)
    }

    fn list_prompts(&self) -> Result<Vec<Prompt>> {
        Ok(self.enter("list_prompts")?.prompts.list_named(|_| true))
    }

    // Profile operations

    fn create_profile(&self, profile: &mut Profile) -> Result<()> {
        self.enter("create_profile")?.profiles.create_named(profile)
    }

    fn get_profile(&self, name: &str) -> Result<Profile> {
        self.enter("get_profile")?.profiles.get_named(name)
    }

    fn update_profile(&self, profile: &Profile) -> Result<u64> {
        self.enter("update_profile")?.profiles.update_named(profile)
    }

    fn upsert_profile(&self, profile: &mut Profile) -> Result<()> {
        self.enter("upsert_profile")?.profiles.upsert_named(profile)
    }

    fn delete_profile(&self, name: &str) -> Result<()> {
        self.enter("delete_profile")?.profiles.delete_named(name).map(drop)
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.enter("list_profiles")?.profiles.list_named(|_| true))
    }

    // Emulator operations

    fn create_emulator(&self, emulator: &mut Emulator) -> Result<()> {
        self.enter("create_emulator")?.emulators.create_named(emulator)
    }

    fn get_emulator(&self, name: &str) -> Result<Emulator> {
        self.enter("get_emulator")?.emulators.get_named(name)
    }

    fn update_emulator(&self, emulator: &Emulator) -> Result<u64> {
        self.enter("update_emulator")?.emulators.update_named(emulator)
    }

    fn upsert_emulator(&self, emulator: &mut Emulator) -> Result<()> {
        self.enter("upsert_emulator")?.emulators.upsert_named(emulator)
    }

    fn delete_emulator(&self, name: &str) -> Result<()> {
        self.enter("delete_emulator")?
            .emulators
            .delete_named(name)
            .map(drop)
    }

    fn list_emulators(&self) -> Result<Vec<Emulator>> {
        Ok(self.enter("list_emulators")?.emulators.list_named(|_| true))
    }

    // Package operations

    fn create_package(&self, package: &mut Package) -> Result<()> {
        self.enter("create_package")?.packages.create_named(package)
    }

    fn get_package(&self, name: &str) -> Result<Package> {
        self.enter("get_package")?.packages.get_named(name)
    }

    fn update_package(&self, package: &Package) -> Result<u64> {
        self.enter("update_package")?.packages.update_named(package)
    }

    fn upsert_package(&self, package: &mut Package) -> Result<()> {
        self.enter("upsert_package")?.packages.upsert_named(package)
    }

    fn delete_package(&self, name: &str) -> Result<()> {
        self.enter("delete_package")?.packages.delete_named(name).map(drop)
    }

    fn list_packages(&self) -> Result<Vec<Package>> {
        Ok(self.enter("list_packages")?.packages.list_named(|_| true))
    }

    // Credential operations

    fn create_credential(&self, credential: &mut Credential) -> Result<()> {
        let mut state = self.enter("create_credential")?;
        if state.credentials.any(|c| {
            c.scope_type == credential.scope_type
                && c.scope_id == credential.scope_id
                && c.name == credential.name
        }) {
            return Err(unique_failed(
                "credentials.scope_type, credentials.scope_id, credentials.name",
            ));
        }
        let ts = now();
        credential.id = state.credentials.next_id();
        credential.created_at = ts;
        credential.updated_at = ts;
        state.credentials.rows.insert(credential.id, credential.clone());
        Ok(())
    }

    fn get_credential(
        &self,
        scope: CredentialScope,
        scope_id: i64,
        name: &str,
    ) -> Result<Credential> {
        let state = self.enter("get_credential")?;
        state
            .credentials
            .find(|c| c.scope_type == scope && c.scope_id == scope_id && c.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found("credential", format!("{scope}/{scope_id}/{name}")))
    }

    fn update_credential(&self, credential: &Credential) -> Result<u64> {
        let mut state = self.enter("update_credential")?;
        let Some(existing) = state.credentials.get(credential.id).cloned() else {
            return Ok(0);
        };
        if state.credentials.any(|c| {
            c.id != credential.id
                && c.scope_type == credential.scope_type
                && c.scope_id == credential.scope_id
                && c.name == credential.name
        }) {
            return Err(unique_failed(
                "credentials.scope_type, credentials.scope_id, credentials.name",
            ));
        }
        let updated = Credential {
            created_at: existing.created_at,
            updated_at: now(),
            ..credential.clone()
        };
        state.credentials.rows.insert(credential.id, updated);
        Ok(1)
    }

    fn delete_credential(&self, scope: CredentialScope, scope_id: i64, name: &str) -> Result<()> {
        let mut state = self.enter("delete_credential")?;
        let id = state
            .credentials
            .find(|c| c.scope_type == scope && c.scope_id == scope_id && c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| Error::not_found("credential", format!("{scope}/{scope_id}/{name}")))?;
        state.credentials.rows.remove(&id);
        Ok(())
    }

    fn list_credentials_by_scope(
        &self,
        scope: CredentialScope,
        scope_id: i64,
    ) -> Result<Vec<Credential>> {
        let state = self.enter("list_credentials_by_scope")?;
        let mut rows = state
            .credentials
            .collect(|c| c.scope_type == scope && c.scope_id == scope_id);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn list_all_credentials(&self) -> Result<Vec<Credential>> {
        let state = self.enter("list_all_credentials")?;
        let mut rows = state.credentials.collect(|_| true);
        rows.sort_by(|a, b| {
            (a.scope_type.as_str(), a.scope_id, &a.name).cmp(&(
                b.scope_type.as_str(),
                b.scope_id,
                &b.name,
            ))
        });
        Ok(rows)
    }

    // Default operations

    fn get_default(&self, key: &str) -> Result<String> {
        let state = self.enter("get_default")?;
        Ok(state
            .defaults
            .get(key)
            .map(|d| d.value.clone())
            .unwrap_or_default())
    }

    fn set_default(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.enter("set_default")?;
        state.defaults.insert(
            key.to_string(),
            DefaultEntry {
                key: key.to_string(),
                value: value.to_string(),
                updated_at: now(),
            },
        );
        Ok(())
    }

    fn delete_default(&self, key: &str) -> Result<()> {
        self.enter("delete_default")?.defaults.remove(key);
        Ok(())
    }

    fn list_defaults(&self) -> Result<Vec<DefaultEntry>> {
        Ok(self
            .enter("list_defaults")?
            .defaults
            .values()
            .cloned()
            .collect())
    }

    // Workspace-plugin operations

    fn add_workspace_plugin(&self, workspace_id: i64, plugin_id: i64) -> Result<()> {
        let mut state = self.enter("add_workspace_plugin")?;
        if state.workspace_plugins.contains_key(&(workspace_id, plugin_id)) {
            return Err(unique_failed(
                "workspace_plugins.workspace_id, workspace_plugins.plugin_id",
            ));
        }
        if !state.workspaces.contains(workspace_id) || !state.plugins.contains(plugin_id) {
            return Err(foreign_key_failed());
        }
        state.workspace_plugins.insert((workspace_id, plugin_id), true);
        Ok(())
    }

    fn remove_workspace_plugin(&self, workspace_id: i64, plugin_id: i64) -> Result<()> {
        let mut state = self.enter("remove_workspace_plugin")?;
        state
            .workspace_plugins
            .remove(&(workspace_id, plugin_id))
            .map(drop)
            .ok_or_else(|| {
                Error::not_found("workspace plugin", format!("{workspace_id}/{plugin_id}"))
            })
    }

    fn list_workspace_plugins(&self, workspace_id: i64) -> Result<Vec<Plugin>> {
        let state = self.enter("list_workspace_plugins")?;
        Ok(state.plugins.list_named(|p| {
            state.workspace_plugins.get(&(workspace_id, p.id)) == Some(&true)
        }))
    }

    fn set_workspace_plugin_enabled(
        &self,
        workspace_id: i64,
        plugin_id: i64,
        enabled: bool,
    ) -> Result<()> {
        let mut state = self.enter("set_workspace_plugin_enabled")?;
        match state.workspace_plugins.get_mut(&(workspace_id, plugin_id)) {
            Some(flag) => {
                *flag = enabled;
                Ok(())
            }
            None => Err(Error::not_found(
                "workspace plugin",
                format!("{workspace_id}/{plugin_id}"),
            )),
        }
    }
}
