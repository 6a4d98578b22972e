use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::entities::registry::RepositoryRegistry;
use crate::domain::value_objects::concurrency_policy::ConcurrencyPolicy;

/// Configuration store related errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Configuration file not found at path: {0}")]
    ConfigFileNotFound(String),

    #[error("Configuration file read failed ({path}): {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Configuration file write failed ({path}): {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("JSON parsing failed ({path}): {reason}")]
    JsonParsingFailed { path: String, reason: String },

    #[error("JSON serialization failed: {0}")]
    JsonSerializationFailed(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Configuration directory creation failed: {0}")]
    DirectoryCreationFailed(String),

    #[error("Configuration backup failed: {0}")]
    BackupFailed(String),

    #[error("No configuration directory available on this platform")]
    NoConfigDirectory,
}

impl ConfigStoreError {
    /// File path this error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ConfigFileNotFound(path) => Some(path),
            Self::ReadFailed { path, .. }
            | Self::WriteFailed { path, .. }
            | Self::JsonParsingFailed { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// A repository entry: `{"path": "/abs/path"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RepositoryEntry {
    #[validate(length(min = 1))]
    pub path: String,
}

impl RepositoryEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Optional run defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Maximum simultaneous processes; `0` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// Overall deadline for one invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub timeout_seconds: Option<u64>,
}

/// The configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_references"))]
pub struct GitGroupConfig {
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,

    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl GitGroupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the read-only registry used for one run
    pub fn to_registry(&self) -> RepositoryRegistry {
        let mut registry = RepositoryRegistry::new();
        for (name, entry) in &self.repositories {
            registry.insert_repository(name.clone(), expand_home(&entry.path));
        }
        for (name, members) in &self.groups {
            registry = registry.with_group(name.clone(), members.clone());
        }
        registry
    }

    /// Add (or repoint) a repository and optionally append it to a group
    pub fn add_repository(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        group: Option<&str>,
    ) {
        let name = name.into();
        self.repositories
            .insert(name.clone(), RepositoryEntry::new(path));
        if let Some(group) = group {
            let members = self.groups.entry(group.to_string()).or_default();
            if !members.contains(&name) {
                members.push(name);
            }
        }
    }

    /// Concurrency from settings, CPU count when unset
    pub fn concurrency_policy(&self) -> ConcurrencyPolicy {
        self.settings
            .as_ref()
            .and_then(|s| s.max_concurrency)
            .map(ConcurrencyPolicy::from_limit)
            .unwrap_or_default()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.settings
            .as_ref()
            .and_then(|s| s.timeout_seconds)
            .map(Duration::from_secs)
    }
}

fn validate_references(config: &GitGroupConfig) -> Result<(), ValidationError> {
    for (name, entry) in &config.repositories {
        if !expand_home(&entry.path).is_absolute() {
            let mut error = ValidationError::new("relative_path");
            error.message = Some(
                format!("repository '{}' path must be absolute: {}", name, entry.path).into(),
            );
            return Err(error);
        }
    }

    for (group, members) in &config.groups {
        for member in members {
            if !config.repositories.contains_key(member) {
                let mut error = ValidationError::new("undefined_repository");
                error.message = Some(
                    format!("group '{}' references undefined repository '{}'", group, member)
                        .into(),
                );
                return Err(error);
            }
        }
    }

    Ok(())
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Configuration store for the JSON config file
///
/// Reads are validated; writes keep a `.bak` copy of the previous file.
#[derive(Debug, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// `<config_dir>/gitgroup/config.json`
    pub fn default_config_path() -> Result<PathBuf, ConfigStoreError> {
        dirs::config_dir()
            .map(|dir| dir.join("gitgroup").join("config.json"))
            .ok_or(ConfigStoreError::NoConfigDirectory)
    }

    /// Read and validate the configuration file
    pub fn read_config<P: AsRef<Path>>(
        &self,
        config_path: P,
    ) -> Result<GitGroupConfig, ConfigStoreError> {
        let config_path = config_path.as_ref();
        let display = config_path.display().to_string();

        if !config_path.exists() {
            return Err(ConfigStoreError::ConfigFileNotFound(display));
        }

        let contents = fs::read_to_string(config_path).map_err(|e| ConfigStoreError::ReadFailed {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let config: GitGroupConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigStoreError::JsonParsingFailed {
                path: display,
                reason: e.to_string(),
            })?;

        Self::validate_config(&config)?;

        debug!(
            path = %config_path.display(),
            repositories = config.repositories.len(),
            groups = config.groups.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Read the file, or start from an empty configuration when it does not exist
    pub fn read_or_default<P: AsRef<Path>>(
        &self,
        config_path: P,
    ) -> Result<GitGroupConfig, ConfigStoreError> {
        match self.read_config(config_path) {
            Err(ConfigStoreError::ConfigFileNotFound(_)) => Ok(GitGroupConfig::new()),
            other => other,
        }
    }

    /// Validate, back up the previous file, then replace it atomically
    pub fn write_config<P: AsRef<Path>>(
        &self,
        config_path: P,
        config: &GitGroupConfig,
    ) -> Result<(), ConfigStoreError> {
        let config_path = config_path.as_ref();
        let display = config_path.display().to_string();

        Self::validate_config(config)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigStoreError::DirectoryCreationFailed(e.to_string()))?;
        }

        if config_path.exists() {
            let backup_path = Self::backup_path(config_path);
            fs::copy(config_path, &backup_path)
                .map_err(|e| ConfigStoreError::BackupFailed(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigStoreError::JsonSerializationFailed(e.to_string()))?;

        let tmp_path = config_path.with_extension("json.tmp");
        fs::write(&tmp_path, json + "\n").map_err(|e| ConfigStoreError::WriteFailed {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        fs::rename(&tmp_path, config_path).map_err(|e| ConfigStoreError::WriteFailed {
            path: display,
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// `config.json` -> `config.json.bak`
    pub fn backup_path(config_path: &Path) -> PathBuf {
        let mut name = config_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bak");
        config_path.with_file_name(name)
    }

    fn validate_config(config: &GitGroupConfig) -> Result<(), ConfigStoreError> {
        config.validate().map_err(describe_validation_errors)?;
        for entry in config.repositories.values() {
            entry.validate().map_err(describe_validation_errors)?;
        }
        if let Some(settings) = &config.settings {
            settings.validate().map_err(describe_validation_errors)?;
        }
        Ok(())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_validation_errors(errors: ValidationErrors) -> ConfigStoreError {
    let mut messages = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            match &error.message {
                Some(message) => messages.push(message.to_string()),
                None => messages.push(format!("{}: {}", field, error.code)),
            }
        }
    }
    if messages.is_empty() {
        messages.push(errors.to_string());
    }
    ConfigStoreError::ValidationFailed(messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_config() -> GitGroupConfig {
        let mut config = GitGroupConfig::new();
        config.add_repository("web", "/src/web", Some("frontend"));
        config.add_repository("mobile", "/src/mobile", Some("frontend"));
        config.add_repository("api", "/src/api", Some("backend"));
        config
    }

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "repositories": {
                "web": { "path": "/src/web" },
                "api": { "path": "/src/api" }
            },
            "groups": { "all": ["web", "api"] },
            "settings": { "maxConcurrency": 0, "timeoutSeconds": 30 }
        }"#;
        let config: GitGroupConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.groups["all"], vec!["web", "api"]);
        assert_eq!(config.concurrency_policy(), ConcurrencyPolicy::Unbounded);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(ConfigStore::validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config: GitGroupConfig = serde_json::from_str("{}").unwrap();
        assert!(config.repositories.is_empty());
        assert!(config.groups.is_empty());
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_write_and_read_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");
        let store = ConfigStore::new();
        let original = sample_config();

        store.write_config(&config_path, &original).unwrap();
        let read_back = store.read_config(&config_path).unwrap();

        assert_eq!(read_back, original);
    }

    #[test]
    fn test_read_nonexistent_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.json");
        let store = ConfigStore::new();

        let result = store.read_config(&config_path);
        assert!(matches!(result, Err(ConfigStoreError::ConfigFileNotFound(_))));

        let fallback = store.read_or_default(&config_path).unwrap();
        assert_eq!(fallback, GitGroupConfig::new());
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "{ not json").unwrap();

        let result = ConfigStore::new().read_config(&config_path);
        assert!(matches!(result, Err(ConfigStoreError::JsonParsingFailed { .. })));
    }

    #[test]
    fn test_undefined_group_member_fails_validation() {
        let mut config = sample_config();
        config
            .groups
            .insert("broken".to_string(), vec!["ghost".to_string()]);

        match ConfigStore::validate_config(&config) {
            Err(ConfigStoreError::ValidationFailed(message)) => {
                assert!(message.contains("ghost"), "unexpected message: {}", message)
            }
            other => panic!("Expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_path_fails_validation() {
        let mut config = GitGroupConfig::new();
        config.add_repository("web", "relative/web", None);
        assert!(ConfigStore::validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let mut config = sample_config();
        config.settings = Some(Settings {
            max_concurrency: None,
            timeout_seconds: Some(0),
        });
        assert!(ConfigStore::validate_config(&config).is_err());
    }

    #[test]
    fn test_backup_on_rewrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let store = ConfigStore::new();

        let mut config = sample_config();
        store.write_config(&config_path, &config).unwrap();
        config.add_repository("docs", "/src/docs", Some("frontend"));
        store.write_config(&config_path, &config).unwrap();

        let backup = ConfigStore::backup_path(&config_path);
        assert!(backup.exists());
        let previous: GitGroupConfig =
            serde_json::from_str(&fs::read_to_string(backup).unwrap()).unwrap();
        assert!(!previous.repositories.contains_key("docs"));
    }

    #[test]
    fn test_add_repository_does_not_duplicate_membership() {
        let mut config = sample_config();
        config.add_repository("web", "/elsewhere/web", Some("frontend"));

        assert_eq!(config.groups["frontend"], vec!["web", "mobile"]);
        assert_eq!(config.repositories["web"].path, "/elsewhere/web");
    }

    #[test]
    fn test_to_registry() {
        use crate::domain::entities::registry::RepositoryCatalog;

        let registry = sample_config().to_registry();
        assert_eq!(registry.repository_path("api"), Some(Path::new("/src/api")));
        assert_eq!(
            registry.group_members("frontend").unwrap(),
            &["web".to_string(), "mobile".to_string()]
        );
    }
}
