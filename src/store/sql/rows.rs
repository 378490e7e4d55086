//! Column lists and row mappers. Each mapper reads its entity starting at a
//! column offset so joined rows can be split into their parts.

use crate::driver::Row;
use crate::error::Result;
use crate::types::*;

pub(super) const ECOSYSTEM_COLUMNS: &str = "id, name, description, theme, created_at, updated_at";

pub(super) const DOMAIN_COLUMNS: &str =
    "id, ecosystem_id, name, description, theme, created_at, updated_at";
pub(super) const DOMAIN_WIDTH: usize = 7;

pub(super) const APP_COLUMNS: &str =
    "id, domain_id, name, path, description, language, build_config, created_at, updated_at";
pub(super) const APP_WIDTH: usize = 9;

pub(super) const WORKSPACE_COLUMNS: &str = "id, app_id, name, slug, description, image_name, \
     container_id, status, nvim_structure, nvim_plugins, ssh_agent_forwarding, created_at, \
     updated_at";
pub(super) const WORKSPACE_WIDTH: usize = 13;

pub(super) const CONTEXT_COLUMNS: &str = "active_ecosystem_id, active_domain_id, active_app_id, \
     active_workspace_id, active_project_id, updated_at";

pub(super) const PLUGIN_COLUMNS: &str = "id, name, description, repo, branch, version, priority, \
     lazy, event, ft, config, dependencies, category, enabled, created_at, updated_at";

pub(super) const THEME_COLUMNS: &str = "id, name, description, author, category, plugin_repo, \
     colorscheme, style, transparent, colors, created_at, updated_at";

pub(super) const PROMPT_COLUMNS: &str = "id, name, description, prompt_type, add_newline, \
     palette, format, modules, colors, raw_config, category, enabled, created_at, updated_at";

pub(super) const PROFILE_COLUMNS: &str = "id, name, description, theme, prompt, plugins, \
     shell_config, category, created_at, updated_at";

pub(super) const EMULATOR_COLUMNS: &str = "id, name, description, emulator_type, config, \
     theme_ref, category, enabled, created_at, updated_at";

pub(super) const PACKAGE_COLUMNS: &str =
    "id, name, description, category, plugins, extends, created_at, updated_at";

pub(super) const CREDENTIAL_COLUMNS: &str = "id, scope_type, scope_id, name, source, service, \
     env_var, description, created_at, updated_at";

pub(super) const DEFAULT_COLUMNS: &str = "key, value, updated_at";

pub(super) fn ecosystem_at(row: &Row, at: usize) -> Result<Ecosystem> {
    Ok(Ecosystem {
        id: row.get(at)?,
        name: row.get(at + 1)?,
        description: row.get(at + 2)?,
        theme: row.get(at + 3)?,
        created_at: row.get(at + 4)?,
        updated_at: row.get(at + 5)?,
    })
}

pub(super) fn domain_at(row: &Row, at: usize) -> Result<Domain> {
    Ok(Domain {
        id: row.get(at)?,
        ecosystem_id: row.get(at + 1)?,
        name: row.get(at + 2)?,
        description: row.get(at + 3)?,
        theme: row.get(at + 4)?,
        created_at: row.get(at + 5)?,
        updated_at: row.get(at + 6)?,
    })
}

pub(super) fn app_at(row: &Row, at: usize) -> Result<App> {
    Ok(App {
        id: row.get(at)?,
        domain_id: row.get(at + 1)?,
        name: row.get(at + 2)?,
        path: row.get(at + 3)?,
        description: row.get(at + 4)?,
        language: row.get(at + 5)?,
        build_config: row.get(at + 6)?,
        created_at: row.get(at + 7)?,
        updated_at: row.get(at + 8)?,
    })
}

pub(super) fn workspace_at(row: &Row, at: usize) -> Result<Workspace> {
    Ok(Workspace {
        id: row.get(at)?,
        app_id: row.get(at + 1)?,
        name: row.get(at + 2)?,
        slug: row.get(at + 3)?,
        description: row.get(at + 4)?,
        image_name: row.get(at + 5)?,
        container_id: row.get(at + 6)?,
        status: row.get(at + 7)?,
        nvim_structure: row.get(at + 8)?,
        nvim_plugins: row.get(at + 9)?,
        ssh_agent_forwarding: row.get(at + 10)?,
        created_at: row.get(at + 11)?,
        updated_at: row.get(at + 12)?,
    })
}

pub(super) fn ecosystem(row: &Row) -> Result<Ecosystem> {
    ecosystem_at(row, 0)
}

pub(super) fn domain(row: &Row) -> Result<Domain> {
    domain_at(row, 0)
}

pub(super) fn app(row: &Row) -> Result<App> {
    app_at(row, 0)
}

pub(super) fn workspace(row: &Row) -> Result<Workspace> {
    workspace_at(row, 0)
}

/// Columns: app, domain, ecosystem.
pub(super) fn app_with_hierarchy(row: &Row) -> Result<AppWithHierarchy> {
    let mut at = 0;
    let app = app_at(row, at)?;
    at += APP_WIDTH;
    let domain = domain_at(row, at)?;
    at += DOMAIN_WIDTH;
    let ecosystem = ecosystem_at(row, at)?;
    Ok(AppWithHierarchy {
        app,
        domain,
        ecosystem,
    })
}

/// Columns: workspace, app, domain, ecosystem.
pub(super) fn workspace_with_hierarchy(row: &Row) -> Result<WorkspaceWithHierarchy> {
    let mut at = 0;
    let workspace = workspace_at(row, at)?;
    at += WORKSPACE_WIDTH;
    let app = app_at(row, at)?;
    at += APP_WIDTH;
    let domain = domain_at(row, at)?;
    at += DOMAIN_WIDTH;
    let ecosystem = ecosystem_at(row, at)?;
    Ok(WorkspaceWithHierarchy {
        workspace,
        app,
        domain,
        ecosystem,
    })
}

pub(super) fn context(row: &Row) -> Result<Context> {
    Ok(Context {
        active_ecosystem_id: row.get(0)?,
        active_domain_id: row.get(1)?,
        active_app_id: row.get(2)?,
        active_workspace_id: row.get(3)?,
        active_project_id: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(super) fn plugin(row: &Row) -> Result<Plugin> {
    Ok(Plugin {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        repo: row.get(3)?,
        branch: row.get(4)?,
        version: row.get(5)?,
        priority: row.get(6)?,
        lazy: row.get(7)?,
        event: row.get(8)?,
        ft: row.get(9)?,
        config: row.get(10)?,
        dependencies: row.get(11)?,
        category: row.get(12)?,
        enabled: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

pub(super) fn theme(row: &Row) -> Result<Theme> {
    Ok(Theme {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        author: row.get(3)?,
        category: row.get(4)?,
        plugin_repo: row.get(5)?,
        colorscheme: row.get(6)?,
        style: row.get(7)?,
        transparent: row.get(8)?,
        colors: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub(super) fn prompt(row: &Row) -> Result<Prompt> {
    Ok(Prompt {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        prompt_type: row.get(3)?,
        add_newline: row.get(4)?,
        palette: row.get(5)?,
        format: row.get(6)?,
        modules: row.get(7)?,
        colors: row.get(8)?,
        raw_config: row.get(9)?,
        category: row.get(10)?,
        enabled: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(super) fn profile(row: &Row) -> Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        theme: row.get(3)?,
        prompt: row.get(4)?,
        plugins: row.get(5)?,
        shell_config: row.get(6)?,
        category: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(super) fn emulator(row: &Row) -> Result<Emulator> {
    Ok(Emulator {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        emulator_type: row.get(3)?,
        config: row.get(4)?,
        theme_ref: row.get(5)?,
        category: row.get(6)?,
        enabled: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(super) fn package(row: &Row) -> Result<Package> {
    Ok(Package {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        plugins: row.get(4)?,
        extends: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub(super) fn credential(row: &Row) -> Result<Credential> {
    Ok(Credential {
        id: row.get(0)?,
        scope_type: row.get(1)?,
        scope_id: row.get(2)?,
        name: row.get(3)?,
        source: row.get(4)?,
        service: row.get(5)?,
        env_var: row.get(6)?,
        description: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(super) fn default_entry(row: &Row) -> Result<DefaultEntry> {
    Ok(DefaultEntry {
        key: row.get(0)?,
        value: row.get(1)?,
        updated_at: row.get(2)?,
    })
}
