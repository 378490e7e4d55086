//! Behavioral suite shared by every `DataStore` implementation.
//!
//! Each case is a plain function over `&dyn DataStore`; the `suite!` macro
//! instantiates all of them once against SQLite and once against the
//! in-memory mock, so both backends are held to the same contract.

use std::path::{Path, PathBuf};
use std::sync::Barrier;
use std::thread;

use devspace_store::Error;
use devspace_store::store::{
    CatalogStore, ContextStore, DataStore, HierarchyStore, MockDataStore, workspace_root,
};
use devspace_store::testing::{file_store, memory_store};
use devspace_store::types::*;

struct Tree {
    ecosystem: Ecosystem,
    domain: Domain,
    app: App,
    workspace: Workspace,
}

fn ecosystem(s: &dyn DataStore, name: &str) -> Ecosystem {
    let mut eco = Ecosystem::new(name);
    s.create_ecosystem(&mut eco).unwrap();
    eco
}

fn domain(s: &dyn DataStore, ecosystem_id: i64, name: &str) -> Domain {
    let mut domain = Domain::new(ecosystem_id, name);
    s.create_domain(&mut domain).unwrap();
    domain
}

fn app(s: &dyn DataStore, domain_id: i64, name: &str) -> App {
    let mut app = App::new(domain_id, name, format!("/src/{name}"));
    s.create_app(&mut app).unwrap();
    app
}

fn workspace(s: &dyn DataStore, app_id: i64, name: &str) -> Workspace {
    let mut ws = Workspace::new(app_id, name, "devspace/dev:latest");
    s.create_workspace(&mut ws).unwrap();
    ws
}

fn seed(s: &dyn DataStore) -> Tree {
    let ecosystem = ecosystem(s, "acme");
    let domain = domain(s, ecosystem.id, "platform");
    let app = app(s, domain.id, "billing");
    let workspace = workspace(s, app.id, "dev");
    Tree {
        ecosystem,
        domain,
        app,
        workspace,
    }
}

fn plugin(s: &dyn DataStore, name: &str) -> Plugin {
    let mut plugin = Plugin::new(name, format!("example/{name}.nvim"));
    s.create_plugin(&mut plugin).unwrap();
    plugin
}

fn slugs(rows: &[WorkspaceWithHierarchy]) -> Vec<&str> {
    rows.iter().map(|h| h.workspace.slug.as_str()).collect()
}

// Hierarchy

fn create_writes_back_identity_and_slug(s: &dyn DataStore) {
    let tree = seed(s);

    assert!(tree.ecosystem.id > 0);
    assert!(tree.domain.id > 0);
    assert!(tree.app.id > 0);
    assert!(tree.workspace.id > 0);
    assert_eq!(tree.workspace.created_at, tree.workspace.updated_at);
    assert_eq!(tree.workspace.slug, "acme-platform-billing-dev");
    assert_eq!(tree.workspace.status, WorkspaceStatus::Stopped);
    assert!(!tree.workspace.ssh_agent_forwarding);

    let stored = s.get_workspace_by_slug("acme-platform-billing-dev").unwrap();
    assert_eq!(stored, tree.workspace);
    assert_eq!(s.get_workspace(tree.app.id, "dev").unwrap(), stored);
    assert_eq!(
        workspace_root(Path::new("/srv/workspaces"), &stored.slug),
        PathBuf::from("/srv/workspaces/acme-platform-billing-dev/")
    );
}

fn get_missing_is_not_found(s: &dyn DataStore) {
    let tree = seed(s);

    let err = s.get_ecosystem_by_name("globex").unwrap_err();
    assert_eq!(err.to_string(), "ecosystem not found: globex");
    assert!(s.get_ecosystem_by_id(999).unwrap_err().is_not_found());
    assert!(s.get_domain(tree.ecosystem.id, "nope").unwrap_err().is_not_found());
    assert!(s.get_domain_by_id(999).unwrap_err().is_not_found());
    assert!(s.get_app(tree.domain.id, "nope").unwrap_err().is_not_found());
    assert!(s.get_app_by_id(999).unwrap_err().is_not_found());
    assert!(s.get_workspace(tree.app.id, "nope").unwrap_err().is_not_found());
    assert!(s.get_workspace_by_id(999).unwrap_err().is_not_found());
    assert!(s.get_workspace_by_slug("nope").unwrap_err().is_not_found());
}

fn delete_missing_is_not_found(s: &dyn DataStore) {
    assert!(matches!(
        s.delete_ecosystem("globex"),
        Err(Error::NotFound { entity: "ecosystem", .. })
    ));
    assert!(s.delete_domain(42).unwrap_err().is_not_found());
    assert!(s.delete_app(42).unwrap_err().is_not_found());
    assert!(s.delete_workspace(42).unwrap_err().is_not_found());
}

fn update_missing_affects_nothing(s: &dyn DataStore) {
    let tree = seed(s);

    let ghost = Ecosystem {
        id: 999,
        ..Ecosystem::new("ghost")
    };
    assert_eq!(s.update_ecosystem(&ghost).unwrap(), 0);
    assert!(s.get_ecosystem_by_id(999).unwrap_err().is_not_found());
    assert!(s.get_ecosystem_by_name("ghost").unwrap_err().is_not_found());

    let ghost = Workspace {
        id: 999,
        ..Workspace::new(tree.app.id, "ghost", "img")
    };
    assert_eq!(s.update_workspace(&ghost).unwrap(), 0);
    assert!(s.get_workspace_by_slug("acme-platform-billing-ghost").is_err());
}

fn update_reports_rows_and_persists(s: &dyn DataStore) {
    let tree = seed(s);

    let mut ws = tree.workspace.clone();
    ws.status = WorkspaceStatus::Running;
    ws.container_id = Some("c0ffee".into());
    ws.ssh_agent_forwarding = true;
    assert_eq!(s.update_workspace(&ws).unwrap(), 1);

    let stored = s.get_workspace_by_id(ws.id).unwrap();
    assert_eq!(stored.status, WorkspaceStatus::Running);
    assert_eq!(stored.container_id.as_deref(), Some("c0ffee"));
    assert!(stored.ssh_agent_forwarding);
    assert_eq!(stored.created_at, tree.workspace.created_at);
    assert!(stored.updated_at >= tree.workspace.updated_at);
}

fn optional_text_keeps_three_states(s: &dyn DataStore) {
    let mut unset = Ecosystem::new("unset");
    let mut empty = Ecosystem {
        description: Some(String::new()),
        ..Ecosystem::new("empty")
    };
    let mut set = Ecosystem {
        description: Some("payments".into()),
        ..Ecosystem::new("set")
    };
    for eco in [&mut unset, &mut empty, &mut set] {
        s.create_ecosystem(eco).unwrap();
    }

    assert_eq!(s.get_ecosystem_by_name("unset").unwrap().description, None);
    assert_eq!(
        s.get_ecosystem_by_name("empty").unwrap().description,
        Some(String::new())
    );
    assert_eq!(
        s.get_ecosystem_by_name("set").unwrap().description.as_deref(),
        Some("payments")
    );
}

fn invalid_names_are_rejected(s: &dyn DataStore) {
    for name in ["", "a/b", "line\nbreak"] {
        let err = s.create_ecosystem(&mut Ecosystem::new(name)).unwrap_err();
        assert!(matches!(err, Error::Invalid(_)), "{name:?}: {err}");
    }
    assert!(s.list_ecosystems().unwrap().is_empty());
}

fn duplicates_violate_uniqueness(s: &dyn DataStore) {
    let tree = seed(s);

    let err = s.create_ecosystem(&mut Ecosystem::new("acme")).unwrap_err();
    assert_eq!(err.to_string(), "UNIQUE constraint failed: ecosystems.name");

    let err = s
        .create_domain(&mut Domain::new(tree.ecosystem.id, "platform"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "UNIQUE constraint failed: domains.ecosystem_id, domains.name"
    );

    let err = s
        .create_workspace(&mut Workspace::new(tree.app.id, "dev", "img"))
        .unwrap_err();
    assert!(err.is_constraint_violation());

    // The same name is fine under another parent.
    let other = ecosystem(s, "globex");
    domain(s, other.id, "platform");
}

fn missing_parent_is_foreign_key_violation(s: &dyn DataStore) {
    let err = s.create_domain(&mut Domain::new(999, "orphan")).unwrap_err();
    assert_eq!(err.to_string(), "FOREIGN KEY constraint failed");

    let err = s
        .create_workspace(&mut Workspace::new(999, "orphan", "img"))
        .unwrap_err();
    assert_eq!(err.to_string(), "FOREIGN KEY constraint failed");
}

fn delete_parent_with_children_fails(s: &dyn DataStore) {
    let tree = seed(s);

    assert!(s.delete_ecosystem("acme").unwrap_err().is_constraint_violation());
    assert!(s.delete_domain(tree.domain.id).unwrap_err().is_constraint_violation());
    assert!(s.delete_app(tree.app.id).unwrap_err().is_constraint_violation());

    s.delete_workspace(tree.workspace.id).unwrap();
    s.delete_app(tree.app.id).unwrap();
    s.delete_domain(tree.domain.id).unwrap();
    s.delete_ecosystem("acme").unwrap();
    assert!(s.list_ecosystems().unwrap().is_empty());
}

fn renames_refresh_descendant_slugs(s: &dyn DataStore) {
    let tree = seed(s);
    let staging = workspace(s, tree.app.id, "staging");

    let renamed = Domain {
        name: "infra".into(),
        ..tree.domain.clone()
    };
    assert_eq!(s.update_domain(&renamed).unwrap(), 1);
    assert_eq!(
        s.get_workspace_by_id(tree.workspace.id).unwrap().slug,
        "acme-infra-billing-dev"
    );
    assert_eq!(
        s.get_workspace_by_id(staging.id).unwrap().slug,
        "acme-infra-billing-staging"
    );
    assert!(s.get_workspace_by_slug("acme-platform-billing-dev").is_err());

    let renamed = Ecosystem {
        name: "initech".into(),
        ..tree.ecosystem.clone()
    };
    s.update_ecosystem(&renamed).unwrap();
    let renamed = App {
        name: "invoices".into(),
        ..tree.app.clone()
    };
    s.update_app(&renamed).unwrap();
    assert!(s.get_workspace_by_slug("initech-infra-invoices-dev").is_ok());

    let mut ws = s.get_workspace_by_id(staging.id).unwrap();
    ws.name = "qa".into();
    s.update_workspace(&ws).unwrap();
    assert_eq!(
        s.get_workspace_by_id(staging.id).unwrap().slug,
        "initech-infra-invoices-qa"
    );
}

fn rename_may_swap_slugs_between_siblings(s: &dyn DataStore) {
    let eco = ecosystem(s, "a");
    let short = domain(s, eco.id, "x");
    let long = domain(s, eco.id, "x-x");
    let first = workspace(s, app(s, short.id, "y").id, "z");
    let second = workspace(s, app(s, long.id, "y").id, "z");
    assert_eq!(second.slug, "a-x-x-y-z");

    // The first workspace's new slug is the second one's old slug.
    let renamed = Ecosystem {
        name: "a-x".into(),
        ..eco
    };
    assert_eq!(s.update_ecosystem(&renamed).unwrap(), 1);
    assert_eq!(s.get_workspace_by_id(first.id).unwrap().slug, "a-x-x-y-z");
    assert_eq!(s.get_workspace_by_id(second.id).unwrap().slug, "a-x-x-x-y-z");
}

fn lists_are_ordered_by_name(s: &dyn DataStore) {
    let globex = ecosystem(s, "globex");
    let acme = ecosystem(s, "acme");
    let core = domain(s, globex.id, "core");
    let web = domain(s, acme.id, "web");
    let api = domain(s, acme.id, "api");
    app(s, core.id, "billing");
    app(s, web.id, "storefront");
    app(s, api.id, "billing");
    app(s, api.id, "auth");

    let names: Vec<String> = s.list_ecosystems().unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, ["acme", "globex"]);

    let names: Vec<String> = s.list_domains(acme.id).unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["api", "web"]);

    let names: Vec<String> = s.list_all_domains().unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["api", "web", "core"]);

    let names: Vec<String> = s.list_apps(api.id).unwrap().into_iter().map(|a| a.name).collect();
    assert_eq!(names, ["auth", "billing"]);

    let names: Vec<String> = s.list_all_apps().unwrap().into_iter().map(|a| a.name).collect();
    assert_eq!(names, ["auth", "billing", "storefront", "billing"]);

    let found = s.find_apps_by_name("billing").unwrap();
    let owners: Vec<(&str, &str)> = found
        .iter()
        .map(|h| (h.ecosystem.name.as_str(), h.domain.name.as_str()))
        .collect();
    assert_eq!(owners, [("acme", "api"), ("globex", "core")]);
    assert!(found.iter().all(|h| h.app.domain_id == h.domain.id));
}

fn find_workspaces_applies_every_filter(s: &dyn DataStore) {
    let tree = seed(s);
    workspace(s, tree.app.id, "staging");
    let auth = app(s, tree.domain.id, "auth");
    workspace(s, auth.id, "dev");
    let globex = ecosystem(s, "globex");
    let core = domain(s, globex.id, "core");
    let billing = app(s, core.id, "billing");
    workspace(s, billing.id, "dev");

    let all = s.find_workspaces(&WorkspaceFilter::default()).unwrap();
    assert_eq!(
        slugs(&all),
        [
            "acme-platform-auth-dev",
            "acme-platform-billing-dev",
            "acme-platform-billing-staging",
            "globex-core-billing-dev",
        ]
    );
    assert_eq!(all[1].ecosystem.name, "acme");
    assert_eq!(all[1].app.id, tree.app.id);

    let found = s.find_workspaces(&WorkspaceFilter::default().app("billing")).unwrap();
    assert_eq!(found.len(), 3);

    let found = s
        .find_workspaces(&WorkspaceFilter::default().ecosystem("acme").workspace("dev"))
        .unwrap();
    assert_eq!(
        slugs(&found),
        ["acme-platform-auth-dev", "acme-platform-billing-dev"]
    );

    let exact = WorkspaceFilter::default()
        .ecosystem("acme")
        .domain("platform")
        .app("billing")
        .workspace("staging");
    let found = s.find_workspaces(&exact).unwrap();
    assert_eq!(slugs(&found), ["acme-platform-billing-staging"]);
    let missing = exact.workspace("prod");
    assert!(s.find_workspaces(&missing).unwrap().is_empty());

    let found = s
        .find_workspaces(&WorkspaceFilter::default().ecosystem("").domain("core"))
        .unwrap();
    assert_eq!(slugs(&found), ["globex-core-billing-dev"]);

    let found = s
        .find_workspaces(&WorkspaceFilter::default().ecosystem("initech"))
        .unwrap();
    assert!(found.is_empty());

    let names: Vec<String> = s
        .list_all_workspaces()
        .unwrap()
        .into_iter()
        .map(|w| w.slug)
        .collect();
    assert_eq!(names, slugs(&all));
}

// Context

fn context_pointers_round_trip(s: &dyn DataStore) {
    let initial = s.get_context().unwrap();
    assert_eq!(initial.active_ecosystem_id, None);
    assert_eq!(initial.active_workspace_id, None);

    let tree = seed(s);
    s.set_active_ecosystem(Some(tree.ecosystem.id)).unwrap();
    s.set_active_domain(Some(tree.domain.id)).unwrap();
    s.set_active_app(Some(tree.app.id)).unwrap();
    s.set_active_workspace(Some(tree.workspace.id)).unwrap();

    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.active_ecosystem_id, Some(tree.ecosystem.id));
    assert_eq!(ctx.active_domain_id, Some(tree.domain.id));
    assert_eq!(ctx.active_app_id, Some(tree.app.id));
    assert_eq!(ctx.active_workspace_id, Some(tree.workspace.id));
    assert!(ctx.updated_at >= initial.updated_at);

    s.set_active_app(None).unwrap();
    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.active_app_id, None);
    assert_eq!(ctx.active_workspace_id, Some(tree.workspace.id));
}

fn context_keeps_dangling_pointers(s: &dyn DataStore) {
    let tree = seed(s);
    s.set_active_workspace(Some(tree.workspace.id)).unwrap();
    s.delete_workspace(tree.workspace.id).unwrap();

    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.active_workspace_id, Some(tree.workspace.id));
    assert!(s.get_workspace_by_id(tree.workspace.id).unwrap_err().is_not_found());

    s.set_active_ecosystem(Some(12345)).unwrap();
    assert_eq!(s.get_context().unwrap().active_ecosystem_id, Some(12345));
}

#[allow(deprecated)]
fn legacy_project_pointer_is_writable(s: &dyn DataStore) {
    s.set_active_project(Some(3)).unwrap();
    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.active_project_id, Some(3));
    assert_eq!(ctx.active_ecosystem_id, None);
}

// Catalogs

fn plugin_lifecycle(s: &dyn DataStore) {
    let mut telescope = Plugin {
        category: Some("navigation".into()),
        lazy: true,
        priority: Some(50),
        ..Plugin::new("telescope", "nvim-telescope/telescope.nvim")
    };
    s.create_plugin(&mut telescope).unwrap();
    let mut lsp = Plugin {
        category: Some("lsp".into()),
        enabled: false,
        ..Plugin::new("lspconfig", "neovim/nvim-lspconfig")
    };
    s.create_plugin(&mut lsp).unwrap();
    plugin(s, "harpoon");

    assert_eq!(s.get_plugin_by_name("telescope").unwrap(), telescope);
    assert_eq!(s.get_plugin_by_id(lsp.id).unwrap().name, "lspconfig");

    let names: Vec<String> = s.list_plugins().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["harpoon", "lspconfig", "telescope"]);
    let names: Vec<String> = s
        .list_enabled_plugins()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["harpoon", "telescope"]);
    let by_category = s.list_plugins_by_category("lsp").unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].id, lsp.id);

    lsp.enabled = true;
    assert_eq!(s.update_plugin(&lsp).unwrap(), 1);
    assert_eq!(s.list_enabled_plugins().unwrap().len(), 3);

    let err = s
        .create_plugin(&mut Plugin::new("telescope", "fork/telescope.nvim"))
        .unwrap_err();
    assert_eq!(err.to_string(), "UNIQUE constraint failed: plugins.name");

    s.delete_plugin("harpoon").unwrap();
    assert!(s.delete_plugin("harpoon").unwrap_err().is_not_found());
    assert!(s.get_plugin_by_name("harpoon").unwrap_err().is_not_found());
}

fn upsert_inserts_then_overwrites(s: &dyn DataStore) {
    let mut first = Plugin::new("telescope", "nvim-telescope/telescope.nvim");
    s.upsert_plugin(&mut first).unwrap();
    assert!(first.id > 0);

    let mut second = Plugin {
        branch: Some("0.1.x".into()),
        ..Plugin::new("telescope", "fork/telescope.nvim")
    };
    s.upsert_plugin(&mut second).unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);

    let plugins = s.list_plugins().unwrap();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].repo, "fork/telescope.nvim");
    assert_eq!(plugins[0].branch.as_deref(), Some("0.1.x"));

    let mut theme = Theme::new("tokyonight", "folke/tokyonight.nvim");
    s.upsert_theme(&mut theme).unwrap();
    let mut restyled = Theme {
        style: Some("storm".into()),
        ..Theme::new("tokyonight", "folke/tokyonight.nvim")
    };
    s.upsert_theme(&mut restyled).unwrap();
    assert_eq!(restyled.id, theme.id);
    assert_eq!(s.get_theme("tokyonight").unwrap().style.as_deref(), Some("storm"));
}

fn named_catalogs_round_trip(s: &dyn DataStore) {
    let mut theme = Theme {
        transparent: true,
        colors: Some(r#"{"bg":"none"}"#.into()),
        ..Theme::new("catppuccin", "catppuccin/nvim")
    };
    s.create_theme(&mut theme).unwrap();
    assert_eq!(s.get_theme("catppuccin").unwrap(), theme);
    theme.colorscheme = Some("catppuccin-mocha".into());
    assert_eq!(s.update_theme(&theme).unwrap(), 1);
    assert_eq!(s.list_themes().unwrap()[0].colorscheme.as_deref(), Some("catppuccin-mocha"));
    s.delete_theme("catppuccin").unwrap();
    assert!(s.get_theme("catppuccin").unwrap_err().is_not_found());

    let mut prompt = Prompt {
        add_newline: true,
        ..Prompt::new("minimal", "starship")
    };
    s.create_prompt(&mut prompt).unwrap();
    assert_eq!(s.get_prompt("minimal").unwrap(), prompt);
    assert!(s.delete_prompt("verbose").unwrap_err().is_not_found());
    assert_eq!(s.list_prompts().unwrap().len(), 1);

    let mut profile = Profile {
        theme: Some("catppuccin".into()),
        prompt: Some("minimal".into()),
        ..Profile::new("default")
    };
    s.create_profile(&mut profile).unwrap();
    profile.prompt = None;
    s.update_profile(&profile).unwrap();
    assert_eq!(s.get_profile("default").unwrap().prompt, None);
    assert_eq!(s.list_profiles().unwrap().len(), 1);
    s.delete_profile("default").unwrap();

    let mut emulator = Emulator::new("work", "wezterm");
    s.create_emulator(&mut emulator).unwrap();
    let mut updated = Emulator {
        config: Some("font_size = 13".into()),
        ..Emulator::new("work", "wezterm")
    };
    s.upsert_emulator(&mut updated).unwrap();
    assert_eq!(updated.id, emulator.id);
    assert_eq!(s.list_emulators().unwrap().len(), 1);
    s.delete_emulator("work").unwrap();
    assert!(s.get_emulator("work").unwrap_err().is_not_found());

    let mut base = Package {
        plugins: Some(r#"["telescope"]"#.into()),
        ..Package::new("base")
    };
    s.create_package(&mut base).unwrap();
    let mut go = Package {
        extends: Some("base".into()),
        ..Package::new("go")
    };
    s.upsert_package(&mut go).unwrap();
    let names: Vec<String> = s.list_packages().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["base", "go"]);
    assert_eq!(s.get_package("go").unwrap().extends.as_deref(), Some("base"));
    let err = s.create_package(&mut Package::new("go")).unwrap_err();
    assert_eq!(err.to_string(), "UNIQUE constraint failed: packages.name");
}

fn credentials_are_scoped(s: &dyn DataStore) {
    let tree = seed(s);
    let app_id = tree.app.id;

    let mut token = Credential {
        service: Some("github".into()),
        ..Credential::new(CredentialScope::App, app_id, "token")
    };
    s.create_credential(&mut token).unwrap();
    let mut npm = Credential {
        source: CredentialSource::Env,
        env_var: Some("NPM_TOKEN".into()),
        ..Credential::new(CredentialScope::App, app_id, "npm")
    };
    s.create_credential(&mut npm).unwrap();
    let mut ws_token = Credential::new(CredentialScope::Workspace, tree.workspace.id, "token");
    s.create_credential(&mut ws_token).unwrap();

    let names: Vec<String> = s
        .list_credentials_by_scope(CredentialScope::App, app_id)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["npm", "token"]);
    assert_eq!(s.list_all_credentials().unwrap().len(), 3);

    let stored = s.get_credential(CredentialScope::App, app_id, "npm").unwrap();
    assert_eq!(stored, npm);
    assert_eq!(stored.source, CredentialSource::Env);

    token.source = CredentialSource::Env;
    token.env_var = Some("GITHUB_TOKEN".into());
    assert_eq!(s.update_credential(&token).unwrap(), 1);
    assert_eq!(
        s.get_credential(CredentialScope::App, app_id, "token")
            .unwrap()
            .env_var
            .as_deref(),
        Some("GITHUB_TOKEN")
    );

    let err = s
        .create_credential(&mut Credential::new(CredentialScope::App, app_id, "npm"))
        .unwrap_err();
    assert!(err.is_constraint_violation());

    s.delete_credential(CredentialScope::App, app_id, "npm").unwrap();
    assert!(
        s.delete_credential(CredentialScope::App, app_id, "npm")
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        s.get_credential(CredentialScope::Domain, app_id, "token")
            .unwrap_err()
            .is_not_found()
    );
}

fn defaults_read_missing_as_empty(s: &dyn DataStore) {
    assert_eq!(s.get_default("theme").unwrap(), "");

    s.set_default("theme", "tokyonight").unwrap();
    s.set_default("nvim-package", "base").unwrap();
    s.set_default("theme", "catppuccin").unwrap();
    assert_eq!(s.get_default("theme").unwrap(), "catppuccin");

    let entries = s.list_defaults().unwrap();
    let keys: Vec<&str> = entries.iter().map(|d| d.key.as_str()).collect();
    assert_eq!(keys, ["nvim-package", "theme"]);
    assert_eq!(entries[1].value, "catppuccin");

    s.delete_default("theme").unwrap();
    s.delete_default("theme").unwrap();
    assert_eq!(s.get_default("theme").unwrap(), "");
}

fn workspace_plugins_follow_enabled_flag(s: &dyn DataStore) {
    let tree = seed(s);
    let ws = tree.workspace.id;
    let telescope = plugin(s, "telescope");
    let harpoon = plugin(s, "harpoon");
    plugin(s, "unused");

    s.add_workspace_plugin(ws, telescope.id).unwrap();
    s.add_workspace_plugin(ws, harpoon.id).unwrap();
    let names: Vec<String> = s
        .list_workspace_plugins(ws)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["harpoon", "telescope"]);

    assert!(
        s.add_workspace_plugin(ws, telescope.id)
            .unwrap_err()
            .is_constraint_violation()
    );
    assert!(
        s.add_workspace_plugin(999, telescope.id)
            .unwrap_err()
            .is_constraint_violation()
    );

    s.set_workspace_plugin_enabled(ws, harpoon.id, false).unwrap();
    assert_eq!(s.list_workspace_plugins(ws).unwrap().len(), 1);
    s.set_workspace_plugin_enabled(ws, harpoon.id, true).unwrap();
    assert_eq!(s.list_workspace_plugins(ws).unwrap().len(), 2);

    s.remove_workspace_plugin(ws, harpoon.id).unwrap();
    assert!(s.remove_workspace_plugin(ws, harpoon.id).unwrap_err().is_not_found());
    assert!(
        s.set_workspace_plugin_enabled(ws, harpoon.id, true)
            .unwrap_err()
            .is_not_found()
    );

    s.delete_plugin("telescope").unwrap();
    assert!(s.list_workspace_plugins(ws).unwrap().is_empty());

    s.add_workspace_plugin(ws, harpoon.id).unwrap();
    s.delete_workspace(ws).unwrap();
    assert!(s.list_workspace_plugins(ws).unwrap().is_empty());
}

fn ping_then_close(s: &dyn DataStore) {
    s.ping().unwrap();
    s.close().unwrap();
    assert!(s.ping().is_err());
}

macro_rules! suite {
    ($backend:ident, $make:expr, [$($case:ident),* $(,)?]) => {
        mod $backend {
            use super::*;

            $(
                #[test]
                fn $case() {
                    let store = $make;
                    super::$case(&store);
                }
            )*
        }
    };
}

macro_rules! both_backends {
    ($($case:ident),* $(,)?) => {
        suite!(sqlite, memory_store().expect("in-memory store"), [$($case),*]);
        suite!(mock, MockDataStore::new(), [$($case),*]);
    };
}

both_backends!(
    create_writes_back_identity_and_slug,
    get_missing_is_not_found,
    delete_missing_is_not_found,
    update_missing_affects_nothing,
    update_reports_rows_and_persists,
    optional_text_keeps_three_states,
    invalid_names_are_rejected,
    duplicates_violate_uniqueness,
    missing_parent_is_foreign_key_violation,
    delete_parent_with_children_fails,
    renames_refresh_descendant_slugs,
    rename_may_swap_slugs_between_siblings,
    lists_are_ordered_by_name,
    find_workspaces_applies_every_filter,
    context_pointers_round_trip,
    context_keeps_dangling_pointers,
    legacy_project_pointer_is_writable,
    plugin_lifecycle,
    upsert_inserts_then_overwrites,
    named_catalogs_round_trip,
    credentials_are_scoped,
    defaults_read_missing_as_empty,
    workspace_plugins_follow_enabled_flag,
    ping_then_close,
);

#[test]
fn test_concurrent_upserts_leave_one_row() {
    let temp = tempfile::TempDir::new().unwrap();
    let store = file_store(temp.path().join("devspace.db")).unwrap();
    let repos = ["first/telescope.nvim", "second/telescope.nvim"];
    let start = Barrier::new(repos.len());

    let outcomes: Vec<Vec<devspace_store::Result<()>>> = thread::scope(|scope| {
        let handles: Vec<_> = repos
            .iter()
            .map(|repo| {
                let (store, start) = (&store, &start);
                scope.spawn(move || {
                    start.wait();
                    (0..20)
                        .map(|_| store.upsert_plugin(&mut Plugin::new("telescope", *repo)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // A writer may only lose the insert race, never fail otherwise.
    for result in outcomes.iter().flatten() {
        if let Err(err) = result {
            assert!(err.is_constraint_violation(), "{err}");
        }
    }
    assert!(outcomes.iter().flatten().filter(|r| r.is_ok()).count() >= 20);

    let plugins = store.list_plugins().unwrap();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].name, "telescope");
    assert!(repos.contains(&plugins[0].repo.as_str()));
}
