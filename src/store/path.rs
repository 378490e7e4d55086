use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 255;

/// Checks a hierarchy name before it is persisted.
///
/// Names become path and slug components, so they may not be empty, exceed
/// 255 characters, or contain `/`, NUL, CR or LF.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Invalid(format!("{kind} name cannot be empty")));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Invalid(format!(
            "{kind} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }

    const INVALID_CHARS: &[char] = &['/', '\0', '\n', '\r'];
    if name.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::Invalid(format!(
            "{kind} name contains invalid characters: {name:?}"
        )));
    }

    Ok(())
}

/// `ecosystem-domain-app-workspace`.
pub fn workspace_slug(ecosystem: &str, domain: &str, app: &str, workspace: &str) -> String {
    format!("{ecosystem}-{domain}-{app}-{workspace}")
}

/// On-disk root of a workspace: `base/slug/`.
pub fn workspace_root(base: impl AsRef<Path>, slug: &str) -> PathBuf {
    // Empty last component keeps the trailing separator.
    base.as_ref().join(slug).join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_slug() {
        assert_eq!(
            workspace_slug("acme", "platform", "billing", "dev"),
            "acme-platform-billing-dev"
        );
    }

    #[test]
    fn test_workspace_root_has_trailing_separator() {
        let root = workspace_root("/home/u/.devspace/workspaces", "acme-platform-billing-dev");
        assert_eq!(
            root.to_string_lossy(),
            "/home/u/.devspace/workspaces/acme-platform-billing-dev/"
        );
    }

    #[test]
    fn test_validate_name_accepts_ordinary_names() {
        assert!(validate_name("ecosystem", "acme").is_ok());
        assert!(validate_name("app", "billing-api_v2").is_ok());
        assert!(validate_name("app", "naïve").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_empty() {
        let err = validate_name("domain", "").unwrap_err();
        assert!(matches!(&err, Error::Invalid(msg) if msg.starts_with("domain")));
    }

    #[test]
    fn test_validate_name_rejects_long() {
        assert!(validate_name("app", &"a".repeat(255)).is_ok());
        assert!(validate_name("app", &"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_name_rejects_invalid_chars() {
        for bad in ["a/b", "a\0b", "a\nb", "a\rb"] {
            assert!(validate_name("workspace", bad).is_err(), "{bad:?}");
        }
    }
}
