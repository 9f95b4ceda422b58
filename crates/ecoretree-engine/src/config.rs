//! Editor configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! workspace_root = "file:///home/me/workspace"
//! document_id = "library.ecore"
//!
//! [logging]
//! profile = "production"
//! ```

use std::path::Path;

use ecoretree_core::commands::owner_base;
use ecoretree_core::logging_facility::Profile;
use ecoretree_core::{Result, SyncError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Workspace root URI, e.g. `file:///home/me/workspace`
    pub workspace_root: String,
    /// Document path relative to the workspace root
    pub document_id: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub profile: Profile,
}

impl SyncConfig {
    pub fn new(workspace_root: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            document_id: document_id.into(),
            logging: LoggingConfig::default(),
        }
    }

    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `Config` when the text is not valid TOML or misses a required key.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(raw).map_err(|e| SyncError::Config {
            reason: e.to_string(),
        })?;
        if config.document_id.trim().is_empty() {
            return Err(SyncError::Config {
                reason: "document_id must not be empty".to_string(),
            });
        }
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// `Config` when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| SyncError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Locator prefix of owner references into this document
    pub fn owner_base(&self) -> String {
        owner_base(&self.workspace_root, &self.document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = SyncConfig::from_toml_str(
            r#"
workspace_root = "file:///ws"
document_id = "library.ecore"

[logging]
profile = "production"
"#,
        )
        .unwrap();

        assert_eq!(config.document_id, "library.ecore");
        assert_eq!(config.logging.profile, Profile::Production);
        assert_eq!(config.owner_base(), "file:/ws/library.ecore");
    }

    #[test]
    fn test_logging_defaults_to_development() {
        let config =
            SyncConfig::from_toml_str("workspace_root = \"file:///ws\"\ndocument_id = \"a.ecore\"")
                .unwrap();
        assert_eq!(config.logging.profile, Profile::Development);
    }

    #[test]
    fn test_missing_document_id_is_config_error() {
        let err = SyncConfig::from_toml_str("workspace_root = \"file:///ws\"").unwrap_err();
        assert!(matches!(err, SyncError::Config { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecoretree.toml");
        std::fs::write(&path, "workspace_root = \"file:///ws\"\ndocument_id = \"m.ecore\"\n").unwrap();

        let config = SyncConfig::load(&path).unwrap();
        assert_eq!(config, SyncConfig::new("file:///ws", "m.ecore"));
    }
}
