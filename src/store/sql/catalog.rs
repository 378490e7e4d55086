use super::rows::{
    self, CREDENTIAL_COLUMNS, DEFAULT_COLUMNS, EMULATOR_COLUMNS, PACKAGE_COLUMNS, PLUGIN_COLUMNS,
    PROFILE_COLUMNS, PROMPT_COLUMNS, THEME_COLUMNS,
};
use super::{SqlDataStore, delete_one, fetch_all, fetch_one, inserted, qualified};
use crate::driver::Executor;
use crate::error::{Error, Result, ResultExt};
use crate::params;
use crate::store::CatalogStore;
use crate::types::*;

/// Read-then-branch upsert shared by every name-keyed catalog.
///
/// On update the stored id is adopted and the value is re-read so the
/// caller sees the stamped `updated_at`.
fn upsert_by_name<T>(
    value: &mut T,
    name: &str,
    get: impl Fn(&str) -> Result<T>,
    create: impl FnOnce(&mut T) -> Result<()>,
    update: impl FnOnce(&T) -> Result<u64>,
    set_id: impl FnOnce(&mut T, i64),
    id_of: impl Fn(&T) -> i64,
) -> Result<()> {
    match get(name) {
        Ok(existing) => {
            set_id(value, id_of(&existing));
            update(value)?;
            *value = get(name)?;
            Ok(())
        }
        Err(e) if e.is_not_found() => create(value),
        Err(e) => Err(e),
    }
}

impl CatalogStore for SqlDataStore {
    // Plugin operations

    fn create_plugin(&self, plugin: &mut Plugin) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO plugins (name, description, repo, branch, version, priority, lazy, \
             event, ft, config, dependencies, category, enabled, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    plugin.name.as_str(),
                    plugin.description.as_deref(),
                    plugin.repo.as_str(),
                    plugin.branch.as_deref(),
                    plugin.version.as_deref(),
                    plugin.priority,
                    plugin.lazy,
                    plugin.event.as_deref(),
                    plugin.ft.as_deref(),
                    plugin.config.as_deref(),
                    plugin.dependencies.as_deref(),
                    plugin.category.as_deref(),
                    plugin.enabled
                ],
            )
            .context(|| "create plugin".into())?;
        (plugin.id, plugin.created_at, plugin.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_plugin_by_name(&self, name: &str) -> Result<Plugin> {
        let sql = format!("SELECT {PLUGIN_COLUMNS} FROM plugins WHERE name = ?1");
        fetch_one(&*self.driver, &sql, params![name], rows::plugin, "plugin", name)
            .context(|| "get plugin".into())
    }

    fn get_plugin_by_id(&self, id: i64) -> Result<Plugin> {
        let sql = format!("SELECT {PLUGIN_COLUMNS} FROM plugins WHERE id = ?1");
        fetch_one(&*self.driver, &sql, params![id], rows::plugin, "plugin", id)
            .context(|| "get plugin".into())
    }

    fn update_plugin(&self, plugin: &Plugin) -> Result<u64> {
        let sql = format!(
            "UPDATE plugins SET name = ?1, description = ?2, repo = ?3, branch = ?4, \
             version = ?5, priority = ?6, lazy = ?7, event = ?8, ft = ?9, config = ?10, \
             dependencies = ?11, category = ?12, enabled = ?13, updated_at = {} WHERE id = ?14",
            self.now()
        );
        let result = self
            .driver
            .execute(
                &sql,
                params![
                    plugin.name.as_str(),
                    plugin.description.as_deref(),
                    plugin.repo.as_str(),
                    plugin.branch.as_deref(),
                    plugin.version.as_deref(),
                    plugin.priority,
                    plugin.lazy,
                    plugin.event.as_deref(),
                    plugin.ft.as_deref(),
                    plugin.config.as_deref(),
                    plugin.dependencies.as_deref(),
                    plugin.category.as_deref(),
                    plugin.enabled,
                    plugin.id
                ],
            )
            .context(|| "update plugin".into())?;
        Ok(result.rows_affected)
    }

    fn upsert_plugin(&self, plugin: &mut Plugin) -> Result<()> {
        let name = plugin.name.clone();
        upsert_by_name(
            plugin,
            &name,
            |n| self.get_plugin_by_name(n),
            |p| self.create_plugin(p),
            |p| self.update_plugin(p),
            |p, id| p.id = id,
            |p| p.id,
        )
    }

    fn delete_plugin(&self, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM plugins WHERE name = ?1",
            params![name],
            "plugin",
            name,
        )
        .context(|| "delete plugin".into())
    }

    fn list_plugins(&self) -> Result<Vec<Plugin>> {
        let sql = format!("SELECT {PLUGIN_COLUMNS} FROM plugins ORDER BY name");
        fetch_all(&*self.driver, &sql, params![], rows::plugin).context(|| "list plugins".into())
    }

    fn list_plugins_by_category(&self, category: &str) -> Result<Vec<Plugin>> {
        let sql =
            format!("SELECT {PLUGIN_COLUMNS} FROM plugins WHERE category = ?1 ORDER BY name");
        fetch_all(&*self.driver, &sql, params![category], rows::plugin)
            .context(|| "list plugins".into())
    }

    fn list_enabled_plugins(&self) -> Result<Vec<Plugin>> {
        let sql = format!(
            "SELECT {PLUGIN_COLUMNS} FROM plugins WHERE enabled = {} ORDER BY name",
            self.qb.boolean(true)
        );
        fetch_all(&*self.driver, &sql, params![], rows::plugin).context(|| "list plugins".into())
    }

    // Theme operations

    fn create_theme(&self, theme: &mut Theme) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO themes (name, description, author, category, plugin_repo, colorscheme, \
             style, transparent, colors, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    theme.name.as_str(),
                    theme.description.as_deref(),
                    theme.author.as_deref(),
                    theme.category.as_deref(),
                    theme.plugin_repo.as_str(),
                    theme.colorscheme.as_deref(),
                    theme.style.as_deref(),
                    theme.transparent,
                    theme.colors.as_deref()
                ],
            )
            .context(|| "create theme".into())?;
        (theme.id, theme.created_at, theme.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_theme(&self, name: &str) -> Result<Theme> {
        let sql = format!("SELECT {THEME_COLUMNS} FROM themes WHERE name = ?1");
        fetch_one(&*self.driver, &sql, params![name], rows::theme, "theme", name)
            .context(|| "get theme".into())
    }

    fn update_theme(&self, theme: &Theme) -> Result<u64> {
        let sql = format!(
            "UPDATE themes SET name = ?1, description = ?2, author = ?3, category = ?4, \
             plugin_repo = ?5, colorscheme = ?6, style = ?7, transparent = ?8, colors = ?9, \
             updated_at = {} WHERE id = ?10",
            self.now()
        );
        let result = self
            .driver
            .execute(
                &sql,
                params![
                    theme.name.as_str(),
                    theme.description.as_deref(),
                    theme.author.as_deref(),
                    theme.category.as_deref(),
                    theme.plugin_repo.as_str(),
                    theme.colorscheme.as_deref(),
                    theme.style.as_deref(),
                    theme.transparent,
                    theme.colors.as_deref(),
                    theme.id
                ],
            )
            .context(|| "update theme".into())?;
        Ok(result.rows_affected)
    }

    fn upsert_theme(&self, theme: &mut Theme) -> Result<()> {
        let name = theme.name.clone();
        upsert_by_name(
            theme,
            &name,
            |n| self.get_theme(n),
            |t| self.create_theme(t),
            |t| self.update_theme(t),
            |t, id| t.id = id,
            |t| t.id,
        )
    }

    fn delete_theme(&self, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM themes WHERE name = ?1",
            params![name],
            "theme",
            name,
        )
        .context(|| "delete theme".into())
    }

    fn list_themes(&self) -> Result<Vec<Theme>> {
        let sql = format!("SELECT {THEME_COLUMNS} FROM themes ORDER BY name");
        fetch_all(&*self.driver, &sql, params![], rows::theme).context(|| "list themes".into())
    }

    // Prompt operations

    fn create_prompt(&self, prompt: &mut Prompt) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO prompts (name, description, prompt_type, add_newline, palette, format, \
             modules, colors, raw_config, category, enabled, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    prompt.name.as_str(),
                    prompt.description.as_deref(),
                    prompt.prompt_type.as_str(),
                    prompt.add_newline,
                    prompt.palette.as_deref(),
                    prompt.format.as_deref(),
                    prompt.modules.as_deref(),
                    prompt.colors.as_deref(),
                    prompt.raw_config.as_deref(),
                    prompt.category.as_deref(),
                    prompt.enabled
                ],
            )
            .context(|| "create prompt".into())?;
        (prompt.id, prompt.created_at, prompt.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_prompt(&self, name: &str) -> Result<Prompt> {
        let sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE name = ?1");
        fetch_one(&*self.driver, &sql, params![name], rows::prompt, "prompt", name)
            .context(|| "get prompt".into())
    }

    fn update_prompt(&self, prompt: &Prompt) -> Result<u64> {
        let sql = format!(
            "UPDATE prompts SET name = ?1, description = ?2, prompt_type = ?3, add_newline = ?4, \
             palette = ?5, format = ?6, modules = ?7, colors = ?8, raw_config = ?9, \
             category = ?10, enabled = ?11, updated_at = {} WHERE id = ?12",
            self.now()
        );
        let result = self
            .driver
            .execute(
                &sql,
                params![
                    prompt.name.as_str(),
                    prompt.description.as_deref(),
                    prompt.prompt_type.as_str(),
                    prompt.add_newline,
                    prompt.palette.as_deref(),
                    prompt.format.as_deref(),
                    prompt.modules.as_deref(),
                    prompt.colors.as_deref(),
                    prompt.raw_config.as_deref(),
                    prompt.category.as_deref(),
                    prompt.enabled,
                    prompt.id
                ],
            )
            .context(|| "update prompt".into())?;
        Ok(result.rows_affected)
    }

    fn upsert_prompt(&self, prompt: &mut Prompt) -> Result<()> {
        let name = prompt.name.clone();
        upsert_by_name(
            prompt,
            &name,
            |n| self.get_prompt(n),
            |p| self.create_prompt(p),
            |p| self.update_prompt(p),
            |p, id| p.id = id,
            |p| p.id,
        )
    }

    fn delete_prompt(&self, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM prompts WHERE name = ?1",
            params![name],
            "prompt",
            name,
        )
        .context(|| "delete prompt".into())
    }

    fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts ORDER BY name");
        fetch_all(&*self.driver, &sql, params![], rows::prompt).context(|| "list prompts".into())
    }

    // Profile operations

    fn create_profile(&self, profile: &mut Profile) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO profiles (name, description, theme, prompt, plugins, shell_config, \
             category, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    profile.name.as_str(),
                    profile.description.as_deref(),
                    profile.theme.as_deref(),
                    profile.prompt.as_deref(),
                    profile.plugins.as_deref(),
                    profile.shell_config.as_deref(),
                    profile.category.as_deref()
                ],
            )
            .context(|| "create profile".into())?;
        (profile.id, profile.created_at, profile.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_profile(&self, name: &str) -> Result<Profile> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE name = ?1");
        fetch_one(&*self.driver, &sql, params![name], rows::profile, "profile", name)
            .context(|| "get profile".into())
    }

    fn update_profile(&self, profile: &Profile) -> Result<u64> {
        let sql = format!(
            "UPDATE profiles SET name = ?1, description = ?2, theme = ?3, prompt = ?4, \
             plugins = ?5, shell_config = ?6, category = ?7, updated_at = {} WHERE id = ?8",
            self.now()
        );
        let result = self
            .driver
            .execute(
                &sql,
                params![
                    profile.name.as_str(),
                    profile.description.as_deref(),
                    profile.theme.as_deref(),
                    profile.prompt.as_deref(),
                    profile.plugins.as_deref(),
                    profile.shell_config.as_deref(),
                    profile.category.as_deref(),
                    profile.id
                ],
            )
            .context(|| "update profile".into())?;
        Ok(result.rows_affected)
    }

    fn upsert_profile(&self, profile: &mut Profile) -> Result<()> {
        let name = profile.name.clone();
        upsert_by_name(
            profile,
            &name,
            |n| self.get_profile(n),
            |p| self.create_profile(p),
            |p| self.update_profile(p),
            |p, id| p.id = id,
            |p| p.id,
        )
    }

    fn delete_profile(&self, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM profiles WHERE name = ?1",
            params![name],
            "profile",
            name,
        )
        .context(|| "delete profile".into())
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY name");
        fetch_all(&*self.driver, &sql, params![], rows::profile)
            .context(|| "list profiles".into())
    }

    // Emulator operations

    fn create_emulator(&self, emulator: &mut Emulator) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO emulators (name, description, emulator_type, config, theme_ref, \
             category, enabled, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    emulator.name.as_str(),
                    emulator.description.as_deref(),
                    emulator.emulator_type.as_str(),
                    emulator.config.as_deref(),
                    emulator.theme_ref.as_deref(),
                    emulator.category.as_deref(),
                    emulator.enabled
                ],
            )
            .context(|| "create emulator".into())?;
        (emulator.id, emulator.created_at, emulator.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_emulator(&self, name: &str) -> Result<Emulator> {
        let sql = format!("SELECT {EMULATOR_COLUMNS} FROM emulators WHERE name = ?1");
        fetch_one(&*self.driver, &sql, params![name], rows::emulator, "emulator", name)
            .context(|| "get emulator".into())
    }

    fn update_emulator(&self, emulator: &Emulator) -> Result<u64> {
        let sql = format!(
            "UPDATE emulators SET name = ?1, description = ?2, emulator_type = ?3, config = ?4, \
             theme_ref = ?5, category = ?6, enabled = ?7, updated_at = {} WHERE id = ?8",
            self.now()
        );
        let result = self
            .driver
            .execute(
                &sql,
                params![
                    emulator.name.as_str(),
                    emulator.description.as_deref(),
                    emulator.emulator_type.as_str(),
                    emulator.config.as_deref(),
                    emulator.theme_ref.as_deref(),
                    emulator.category.as_deref(),
                    emulator.enabled,
                    emulator.id
                ],
            )
            .context(|| "update emulator".into())?;
        Ok(result.rows_affected)
    }

    fn upsert_emulator(&self, emulator: &mut Emulator) -> Result<()> {
        let name = emulator.name.clone();
        upsert_by_name(
            emulator,
            &name,
            |n| self.get_emulator(n),
            |e| self.create_emulator(e),
            |e| self.update_emulator(e),
            |e, id| e.id = id,
            |e| e.id,
        )
    }

    fn delete_emulator(&self, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM emulators WHERE name = ?1",
            params![name],
            "emulator",
            name,
        )
        .context(|| "delete emulator".into())
    }

    fn list_emulators(&self) -> Result<Vec<Emulator>> {
        let sql = format!("SELECT {EMULATOR_COLUMNS} FROM emulators ORDER BY name");
        fetch_all(&*self.driver, &sql, params![], rows::emulator)
            .context(|| "list emulators".into())
    }

    // Package operations

    fn create_package(&self, package: &mut Package) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO packages (name, description, category, plugins, extends, created_at, \
             updated_at) VALUES (?1, ?2, ?3, ?4, ?5, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    package.name.as_str(),
                    package.description.as_deref(),
                    package.category.as_deref(),
                    package.plugins.as_deref(),
                    package.extends.as_deref()
                ],
            )
            .context(|| "create package".into())?;
        (package.id, package.created_at, package.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_package(&self, name: &str) -> Result<Package> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE name = ?1");
        fetch_one(&*self.driver, &sql, params![name], rows::package, "package", name)
            .context(|| "get package".into())
    }

    fn update_package(&self, package: &Package) -> Result<u64> {
        let sql = format!(
            "UPDATE packages SET name = ?1, description = ?2, category = ?3, plugins = ?4, \
             extends = ?5, updated_at = {} WHERE id = ?6",
            self.now()
        );
        let result = self
            .driver
            .execute(
                &sql,
                params![
                    package.name.as_str(),
                    package.description.as_deref(),
                    package.category.as_deref(),
                    package.plugins.as_deref(),
                    package.extends.as_deref(),
                    package.id
                ],
            )
            .context(|| "update package".into())?;
        Ok(result.rows_affected)
    }

    fn upsert_package(&self, package: &mut Package) -> Result<()> {
        let name = package.name.clone();
        upsert_by_name(
            package,
            &name,
            |n| self.get_package(n),
            |p| self.create_package(p),
            |p| self.update_package(p),
            |p, id| p.id = id,
            |p| p.id,
        )
    }

    fn delete_package(&self, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM packages WHERE name = ?1",
            params![name],
            "package",
            name,
        )
        .context(|| "delete package".into())
    }

    fn list_packages(&self) -> Result<Vec<Package>> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages ORDER BY name");
        fetch_all(&*self.driver, &sql, params![], rows::package)
            .context(|| "list packages".into())
    }

    // Credential operations

    fn create_credential(&self, credential: &mut Credential) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO credentials (scope_type, scope_id, name, source, service, env_var, \
             description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, {now}, {now}) \
             RETURNING id, created_at, updated_at"
        );
        let row = self
            .driver
            .query_row(
                &sql,
                params![
                    credential.scope_type,
                    credential.scope_id,
                    credential.name.as_str(),
                    credential.source,
                    credential.service.as_deref(),
                    credential.env_var.as_deref(),
                    credential.description.as_deref()
                ],
            )
            .context(|| "create credential".into())?;
        (credential.id, credential.created_at, credential.updated_at) = inserted(&row)?;
        Ok(())
    }

    fn get_credential(
        &self,
        scope: CredentialScope,
        scope_id: i64,
        name: &str,
    ) -> Result<Credential> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials \
             WHERE scope_type = ?1 AND scope_id = ?2 AND name = ?3"
        );
        fetch_one(
            &*self.driver,
            &sql,
            params![scope, scope_id, name],
            rows::credential,
            "credential",
            format!("{scope}/{scope_id}/{name}"),
        )
        .context(|| "get credential".into())
    }

    fn update_credential(&self, credential: &Credential) -> Result<u64> {
        let sql = format!(
            "UPDATE credentials SET scope_type = ?1, scope_id = ?2, name = ?3, source = ?4, \
             service = ?5, env_var = ?6, description = ?7, updated_at = {} WHERE id = ?8",
            self.now()
        );
        let result = self
            .driver
            .execute(
                &sql,
                params![
                    credential.scope_type,
                    credential.scope_id,
                    credential.name.as_str(),
                    credential.source,
                    credential.service.as_deref(),
                    credential.env_var.as_deref(),
                    credential.description.as_deref(),
                    credential.id
                ],
            )
            .context(|| "update credential".into())?;
        Ok(result.rows_affected)
    }

    fn delete_credential(&self, scope: CredentialScope, scope_id: i64, name: &str) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM credentials WHERE scope_type = ?1 AND scope_id = ?2 AND name = ?3",
            params![scope, scope_id, name],
            "credential",
            format!("{scope}/{scope_id}/{name}"),
        )
        .context(|| "delete credential".into())
    }

    fn list_credentials_by_scope(
        &self,
        scope: CredentialScope,
        scope_id: i64,
    ) -> Result<Vec<Credential>> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials \
             WHERE scope_type = ?1 AND scope_id = ?2 ORDER BY name"
        );
        fetch_all(&*self.driver, &sql, params![scope, scope_id], rows::credential)
            .context(|| "list credentials".into())
    }

    fn list_all_credentials(&self) -> Result<Vec<Credential>> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials ORDER BY scope_type, scope_id, name"
        );
        fetch_all(&*self.driver, &sql, params![], rows::credential)
            .context(|| "list credentials".into())
    }

    // Default operations

    fn get_default(&self, key: &str) -> Result<String> {
        match self
            .driver
            .query_row("SELECT value FROM defaults WHERE key = ?1", params![key])
        {
            Ok(row) => row.get(0),
            Err(Error::NoRows) => Ok(String::new()),
            Err(e) => Err(e.context("get default")),
        }
    }

    fn set_default(&self, key: &str, value: &str) -> Result<()> {
        let now = self.now();
        let sql = format!(
            "INSERT INTO defaults (key, value, updated_at) VALUES (?1, ?2, {now}) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = {now}"
        );
        self.driver
            .execute(&sql, params![key, value])
            .context(|| "set default".into())?;
        Ok(())
    }

    fn delete_default(&self, key: &str) -> Result<()> {
        self.driver
            .execute("DELETE FROM defaults WHERE key = ?1", params![key])
            .context(|| "delete default".into())?;
        Ok(())
    }

    fn list_defaults(&self) -> Result<Vec<DefaultEntry>> {
        let sql = format!("SELECT {DEFAULT_COLUMNS} FROM defaults ORDER BY key");
        fetch_all(&*self.driver, &sql, params![], rows::default_entry)
            .context(|| "list defaults".into())
    }

    // Workspace-plugin operations

    fn add_workspace_plugin(&self, workspace_id: i64, plugin_id: i64) -> Result<()> {
        let sql = format!(
            "INSERT INTO workspace_plugins (workspace_id, plugin_id, enabled, created_at) \
             VALUES (?1, ?2, {}, {})",
            self.qb.boolean(true),
            self.now()
        );
        self.driver
            .execute(&sql, params![workspace_id, plugin_id])
            .context(|| "add workspace plugin".into())?;
        Ok(())
    }

    fn remove_workspace_plugin(&self, workspace_id: i64, plugin_id: i64) -> Result<()> {
        delete_one(
            &*self.driver,
            "DELETE FROM workspace_plugins WHERE workspace_id = ?1 AND plugin_id = ?2",
            params![workspace_id, plugin_id],
            "workspace plugin",
            format!("{workspace_id}/{plugin_id}"),
        )
        .context(|| "remove workspace plugin".into())
    }

    fn list_workspace_plugins(&self, workspace_id: i64) -> Result<Vec<Plugin>> {
        let sql = format!(
            "SELECT {} FROM plugins p JOIN workspace_plugins wp ON wp.plugin_id = p.id \
             WHERE wp.workspace_id = ?1 AND wp.enabled = {} ORDER BY p.name",
            qualified("p", PLUGIN_COLUMNS),
            self.qb.boolean(true)
        );
        fetch_all(&*self.driver, &sql, params![workspace_id], rows::plugin)
            .context(|| "list workspace plugins".into())
    }

    fn set_workspace_plugin_enabled(
        &self,
        workspace_id: i64,
        plugin_id: i64,
        enabled: bool,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE workspace_plugins SET enabled = {} WHERE workspace_id = ?1 AND plugin_id = ?2",
            self.qb.boolean(enabled)
        );
        let result = self
            .driver
            .execute(&sql, params![workspace_id, plugin_id])
            .context(|| "set workspace plugin".into())?;
        if result.rows_affected == 0 {
            return Err(Error::not_found(
                "workspace plugin",
                format!("{workspace_id}/{plugin_id}"),
            ));
        }
        Ok(())
    }
}
