use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CredentialScope, CredentialSource, WorkspaceStatus};

/// Top-level namespace. Names are globally unique.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ecosystem {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ecosystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Bounded context inside one ecosystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Domain {
    pub id: i64,
    pub ecosystem_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    pub fn new(ecosystem_id: i64, name: impl Into<String>) -> Self {
        Self {
            ecosystem_id,
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Codebase inside one domain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub domain_id: i64,
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Opaque JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_config: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl App {
    pub fn new(domain_id: i64, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            domain_id,
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Isolated development environment inside one app.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub app_id: i64,
    pub name: String,
    /// `ecosystem-domain-app-workspace`, maintained by the store.
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub status: WorkspaceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvim_structure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvim_plugins: Option<String>,
    pub ssh_agent_forwarding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(app_id: i64, name: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            app_id,
            name: name.into(),
            image_name: image_name.into(),
            ..Self::default()
        }
    }
}

/// A workspace bundled with its full ancestor chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceWithHierarchy {
    pub workspace: Workspace,
    pub app: App,
    pub domain: Domain,
    pub ecosystem: Ecosystem,
}

/// An app bundled with its ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppWithHierarchy {
    pub app: App,
    pub domain: Domain,
    pub ecosystem: Ecosystem,
}

/// Name filters for cross-hierarchy workspace search. `None` and empty
/// strings both mean "any".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkspaceFilter {
    pub ecosystem: Option<String>,
    pub domain: Option<String>,
    pub app: Option<String>,
    pub workspace: Option<String>,
}

impl WorkspaceFilter {
    #[must_use]
    pub fn ecosystem(mut self, name: impl Into<String>) -> Self {
        self.ecosystem = Some(name.into());
        self
    }

    #[must_use]
    pub fn domain(mut self, name: impl Into<String>) -> Self {
        self.domain = Some(name.into());
        self
    }

    #[must_use]
    pub fn app(mut self, name: impl Into<String>) -> Self {
        self.app = Some(name.into());
        self
    }

    #[must_use]
    pub fn workspace(mut self, name: impl Into<String>) -> Self {
        self.workspace = Some(name.into());
        self
    }
}

/// The singleton active-selection record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Context {
    pub active_ecosystem_id: Option<i64>,
    pub active_domain_id: Option<i64>,
    pub active_app_id: Option<i64>,
    pub active_workspace_id: Option<i64>,
    /// Deprecated. Kept so older data stays readable.
    pub active_project_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Editor plugin definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plugin {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub repo: String,
    pub branch: Option<String>,
    pub version: Option<String>,
    pub priority: Option<i64>,
    pub lazy: bool,
    pub event: Option<String>,
    pub ft: Option<String>,
    pub config: Option<String>,
    /// JSON array of plugin repos.
    pub dependencies: Option<String>,
    pub category: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plugin {
    pub fn new(name: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo: repo.into(),
            enabled: true,
            ..Self::default()
        }
    }
}

/// Editor colour theme.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub plugin_repo: String,
    pub colorscheme: Option<String>,
    pub style: Option<String>,
    pub transparent: bool,
    /// JSON object of colour overrides.
    pub colors: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Theme {
    pub fn new(name: impl Into<String>, plugin_repo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin_repo: plugin_repo.into(),
            ..Self::default()
        }
    }
}

/// Terminal prompt definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub prompt_type: String,
    pub add_newline: bool,
    pub palette: Option<String>,
    pub format: Option<String>,
    pub modules: Option<String>,
    pub colors: Option<String>,
    pub raw_config: Option<String>,
    pub category: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    pub fn new(name: impl Into<String>, prompt_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt_type: prompt_type.into(),
            enabled: true,
            ..Self::default()
        }
    }
}

/// Terminal profile tying a theme, prompt and shell plugins together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub theme: Option<String>,
    pub prompt: Option<String>,
    pub plugins: Option<String>,
    pub shell_config: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Terminal emulator configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Emulator {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub emulator_type: String,
    pub config: Option<String>,
    pub theme_ref: Option<String>,
    pub category: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Emulator {
    pub fn new(name: impl Into<String>, emulator_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emulator_type: emulator_type.into(),
            enabled: true,
            ..Self::default()
        }
    }
}

/// Named bundle of plugins, optionally extending another package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// JSON array of plugin names.
    pub plugins: Option<String>,
    pub extends: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Reference to a secret held outside the database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub scope_type: CredentialScope,
    pub scope_id: i64,
    pub name: String,
    pub source: CredentialSource,
    pub service: Option<String>,
    pub env_var: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(scope_type: CredentialScope, scope_id: i64, name: impl Into<String>) -> Self {
        Self {
            scope_type,
            scope_id,
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
