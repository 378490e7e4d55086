use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::driver::{FromValue, Value};
use crate::error::Error;

/// Lifecycle state of a workspace container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceStatus {
    Created,
    #[default]
    Stopped,
    Running,
    Building,
    Error,
}

impl WorkspaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceStatus::Created => "created",
            WorkspaceStatus::Stopped => "stopped",
            WorkspaceStatus::Running => "running",
            WorkspaceStatus::Building => "building",
            WorkspaceStatus::Error => "error",
        }
    }
}

impl FromStr for WorkspaceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(WorkspaceStatus::Created),
            "stopped" => Ok(WorkspaceStatus::Stopped),
            "running" => Ok(WorkspaceStatus::Running),
            "building" => Ok(WorkspaceStatus::Building),
            "error" => Ok(WorkspaceStatus::Error),
            _ => Err(Error::Invalid(format!("unknown workspace status '{s}'"))),
        }
    }
}

/// Hierarchy level a credential is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScope {
    #[default]
    Ecosystem,
    Domain,
    App,
    Workspace,
}

impl CredentialScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialScope::Ecosystem => "ecosystem",
            CredentialScope::Domain => "domain",
            CredentialScope::App => "app",
            CredentialScope::Workspace => "workspace",
        }
    }
}

impl FromStr for CredentialScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ecosystem" => Ok(CredentialScope::Ecosystem),
            "domain" => Ok(CredentialScope::Domain),
            "app" => Ok(CredentialScope::App),
            "workspace" => Ok(CredentialScope::Workspace),
            _ => Err(Error::Invalid(format!("unknown credential scope '{s}'"))),
        }
    }
}

/// Where a credential's secret is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    #[default]
    Keychain,
    Env,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Keychain => "keychain",
            CredentialSource::Env => "env",
        }
    }
}

impl FromStr for CredentialSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keychain" => Ok(CredentialSource::Keychain),
            "env" => Ok(CredentialSource::Env),
            _ => Err(Error::Invalid(format!("unknown credential source '{s}'"))),
        }
    }
}

macro_rules! text_enum {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Text(v.as_str().to_string())
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> std::result::Result<Self, String> {
                let text = String::from_value(value)?;
                text.parse().map_err(|e: Error| e.to_string())
            }
        }
    )*};
}

text_enum!(WorkspaceStatus, CredentialScope, CredentialSource);
