//! Business-level data access over the workspace hierarchy and catalogs.
//!
//! Lookups that match nothing fail with `Error::NotFound`; updates report
//! rows affected and are keyed by identity; lists are ordered by name.

pub mod mock;
pub mod path;
pub mod schema;
mod sql;

pub use mock::MockDataStore;
pub use path::{validate_name, workspace_root, workspace_slug};
pub use sql::SqlDataStore;

use crate::error::Result;
use crate::types::*;

/// Engine message for a write that references a missing parent row.
pub(crate) const FOREIGN_KEY_FAILED: &str = "FOREIGN KEY constraint failed";

/// The ecosystem → domain → app → workspace tree.
///
/// Deleting a parent that still has children fails with a constraint
/// violation. Renaming an ecosystem, domain or app re-derives the slug of
/// every workspace below it.
pub trait HierarchyStore: Send + Sync {
    // Ecosystem operations
    fn create_ecosystem(&self, ecosystem: &mut Ecosystem) -> Result<()>;
    fn get_ecosystem_by_name(&self, name: &str) -> Result<Ecosystem>;
    fn get_ecosystem_by_id(&self, id: i64) -> Result<Ecosystem>;
    fn update_ecosystem(&self, ecosystem: &Ecosystem) -> Result<u64>;
    fn delete_ecosystem(&self, name: &str) -> Result<()>;
    fn list_ecosystems(&self) -> Result<Vec<Ecosystem>>;

    // Domain operations
    fn create_domain(&self, domain: &mut Domain) -> Result<()>;
    fn get_domain(&self, ecosystem_id: i64, name: &str) -> Result<Domain>;
    fn get_domain_by_id(&self, id: i64) -> Result<Domain>;
    fn update_domain(&self, domain: &Domain) -> Result<u64>;
    fn delete_domain(&self, id: i64) -> Result<()>;
    fn list_domains(&self, ecosystem_id: i64) -> Result<Vec<Domain>>;
    /// Every domain, ordered by ecosystem name then domain name.
    fn list_all_domains(&self) -> Result<Vec<Domain>>;

    // App operations
    fn create_app(&self, app: &mut App) -> Result<()>;
    fn get_app(&self, domain_id: i64, name: &str) -> Result<App>;
    fn get_app_by_id(&self, id: i64) -> Result<App>;
    fn update_app(&self, app: &App) -> Result<u64>;
    fn delete_app(&self, id: i64) -> Result<()>;
    fn list_apps(&self, domain_id: i64) -> Result<Vec<App>>;
    /// Every app, ordered by ecosystem, domain, then app name.
    fn list_all_apps(&self) -> Result<Vec<App>>;
    /// Apps called `name` in any domain, with their ancestors.
    fn find_apps_by_name(&self, name: &str) -> Result<Vec<AppWithHierarchy>>;

    // Workspace operations
    fn create_workspace(&self, workspace: &mut Workspace) -> Result<()>;
    fn get_workspace(&self, app_id: i64, name: &str) -> Result<Workspace>;
    fn get_workspace_by_id(&self, id: i64) -> Result<Workspace>;
    fn get_workspace_by_slug(&self, slug: &str) -> Result<Workspace>;
    fn update_workspace(&self, workspace: &Workspace) -> Result<u64>;
    fn delete_workspace(&self, id: i64) -> Result<()>;
    fn list_workspaces(&self, app_id: i64) -> Result<Vec<Workspace>>;
    /// Every workspace, ordered by slug.
    fn list_all_workspaces(&self) -> Result<Vec<Workspace>>;

    /// Workspaces matching every non-empty filter field, ordered by
    /// ecosystem, domain, app, then workspace name.
    fn find_workspaces(&self, filter: &WorkspaceFilter) -> Result<Vec<WorkspaceWithHierarchy>>;
}

/// The singleton active selection.
///
/// Setters overwrite exactly one pointer and stamp `updated_at`; `None`
/// clears it. Pointers are not validated against the hierarchy.
pub trait ContextStore: Send + Sync {
    fn get_context(&self) -> Result<Context>;
    fn set_active_ecosystem(&self, id: Option<i64>) -> Result<()>;
    fn set_active_domain(&self, id: Option<i64>) -> Result<()>;
    fn set_active_app(&self, id: Option<i64>) -> Result<()>;
    fn set_active_workspace(&self, id: Option<i64>) -> Result<()>;
    #[deprecated(note = "projects were replaced by the ecosystem/domain/app hierarchy")]
    fn set_active_project(&self, id: Option<i64>) -> Result<()>;
}

/// Name-keyed configuration catalogs, credentials and defaults.
///
/// `upsert_*` reads by name and then inserts or updates. Two concurrent
/// upserts of the same name are not atomic: the last writer wins, and one
/// of two racing inserts fails with a constraint violation.
pub trait CatalogStore: Send + Sync {
    // Plugin operations
    fn create_plugin(&self, plugin: &mut Plugin) -> Result<()>;
    fn get_plugin_by_name(&self, name: &str) -> Result<Plugin>;
    fn get_plugin_by_id(&self, id: i64) -> Result<Plugin>;
    fn update_plugin(&self, plugin: &Plugin) -> Result<u64>;
    fn upsert_plugin(&self, plugin: &mut Plugin) -> Result<()>;
    fn delete_plugin(&self, name: &str) -> Result<()>;
    fn list_plugins(&self) -> Result<Vec<Plugin>>;
    fn list_plugins_by_category(&self, category: &str) -> Result<Vec<Plugin>>;
    fn list_enabled_plugins(&self) -> Result<Vec<Plugin>>;

    // Theme operations
    fn create_theme(&self, theme: &mut Theme) -> Result<()>;
    fn get_theme(&self, name: &str) -> Result<Theme>;
    fn update_theme(&self, theme: &Theme) -> Result<u64>;
    fn upsert_theme(&self, theme: &mut Theme) -> Result<()>;
    fn delete_theme(&self, name: &str) -> Result<()>;
    fn list_themes(&self) -> Result<Vec<Theme>>;

    // Prompt operations
    fn create_prompt(&self, prompt: &mut Prompt) -> Result<()>;
    fn get_prompt(&self, name: &str) -> Result<Prompt>;
    fn update_prompt(&self, prompt: &Prompt) -> Result<u64>;
    fn upsert_prompt(&self, prompt: &mut Prompt) -> Result<()>;
    fn delete_prompt(&self, name: &str) -> Result<()>;
    fn list_prompts(&self) -> Result<Vec<Prompt>>;

    // Profile operations
    fn create_profile(&self, profile: &mut Profile) -> Result<()>;
    fn get_profile(&self, name: &str) -> Result<Profile>;
    fn update_profile(&self, profile: &Profile) -> Result<u64>;
    fn upsert_profile(&self, profile: &mut Profile) -> Result<()>;
    fn delete_profile(&self, name: &str) -> Result<()>;
    fn list_profiles(&self) -> Result<Vec<Profile>>;

    // Emulator operations
    fn create_emulator(&self, emulator: &mut Emulator) -> Result<()>;
    fn get_emulator(&self, name: &str) -> Result<Emulator>;
    fn update_emulator(&self, emulator: &Emulator) -> Result<u64>;
    fn upsert_emulator(&self, emulator: &mut Emulator) -> Result<()>;
    fn delete_emulator(&self, name: &str) -> Result<()>;
    fn list_emulators(&self) -> Result<Vec<Emulator>>;

    // Package operations
    fn create_package(&self, package: &mut Package) -> Result<()>;
    fn get_package(&self, name: &str) -> Result<Package>;
    fn update_package(&self, package: &Package) -> Result<u64>;
    fn upsert_package(&self, package: &mut Package) -> Result<()>;
    fn delete_package(&self, name: &str) -> Result<()>;
    fn list_packages(&self) -> Result<Vec<Package>>;

    // Credential operations
    fn create_credential(&self, credential: &mut Credential) -> Result<()>;
    fn get_credential(&self, scope: CredentialScope, scope_id: i64, name: &str)
    -> Result<Credential>;
    fn update_credential(&self, credential: &Credential) -> Result<u64>;
    fn delete_credential(&self, scope: CredentialScope, scope_id: i64, name: &str) -> Result<()>;
    fn list_credentials_by_scope(
        &self,
        scope: CredentialScope,
        scope_id: i64,
    ) -> Result<Vec<Credential>>;
    fn list_all_credentials(&self) -> Result<Vec<Credential>>;

    // Default operations
    /// Missing keys read as the empty string.
    fn get_default(&self, key: &str) -> Result<String>;
    fn set_default(&self, key: &str, value: &str) -> Result<()>;
    /// Deleting a missing key is not an error.
    fn delete_default(&self, key: &str) -> Result<()>;
    fn list_defaults(&self) -> Result<Vec<DefaultEntry>>;

    // Workspace-plugin operations
    fn add_workspace_plugin(&self, workspace_id: i64, plugin_id: i64) -> Result<()>;
    fn remove_workspace_plugin(&self, workspace_id: i64, plugin_id: i64) -> Result<()>;
    /// Plugins attached and enabled for the workspace, ordered by name.
    fn list_workspace_plugins(&self, workspace_id: i64) -> Result<Vec<Plugin>>;
    fn set_workspace_plugin_enabled(
        &self,
        workspace_id: i64,
        plugin_id: i64,
        enabled: bool,
    ) -> Result<()>;
}

/// Everything the rest of the tool persists.
pub trait DataStore: HierarchyStore + ContextStore + CatalogStore {
    fn ping(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
}
