use std::path::PathBuf;
use thiserror::Error;

use crate::infrastructure::filesystem::config_store::ConfigStoreError;

#[derive(Error, Debug)]
pub enum GitGroupError {
    #[error("Group not found: {group}")]
    GroupNotFound { group: String },

    #[error("Repository '{repository}' is not defined (referenced by group '{group}')")]
    RepositoryNotFound { repository: String, group: String },

    #[error("No repositories resolved from groups: {}", groups.join(", "))]
    NoTargets { groups: Vec<String> },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Validation error: {field} - {message}")]
    ValidationError {
        field: String,
        message: String,
        value: Option<String>,
    },

    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GitGroupError {
    pub fn group_not_found(group: impl Into<String>) -> Self {
        Self::GroupNotFound {
            group: group.into(),
        }
    }

    pub fn repository_not_found(repository: impl Into<String>, group: impl Into<String>) -> Self {
        Self::RepositoryNotFound {
            repository: repository.into(),
            group: group.into(),
        }
    }

    pub fn no_targets(groups: &[String]) -> Self {
        Self::NoTargets {
            groups: groups.to_vec(),
        }
    }

    pub fn config_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::ConfigError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            path,
            source: Some(Box::new(source)),
        }
    }

    pub fn filesystem_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn validation_error(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    pub fn serialization_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InternalError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// 設定に起因し、実行前に呼び出し全体を中断させるエラーか
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound { .. }
                | Self::RepositoryNotFound { .. }
                | Self::NoTargets { .. }
                | Self::ConfigError { .. }
        )
    }
}

impl From<std::io::Error> for GitGroupError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<serde_json::Error> for GitGroupError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization_error_with_source("JSON serialization failed", error)
    }
}

impl From<ConfigStoreError> for GitGroupError {
    fn from(error: ConfigStoreError) -> Self {
        let path = error.path().map(PathBuf::from);
        Self::config_error_with_source(error.to_string(), path, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_not_found_message() {
        let error = GitGroupError::group_not_found("frontend");
        assert!(matches!(error, GitGroupError::GroupNotFound { .. }));
        assert_eq!(error.to_string(), "Group not found: frontend");
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_no_targets_lists_groups() {
        let error = GitGroupError::no_targets(&["empty".to_string(), "other".to_string()]);
        assert_eq!(
            error.to_string(),
            "No repositories resolved from groups: empty, other"
        );
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_runtime_errors_are_not_configuration_errors() {
        assert!(!GitGroupError::validation_error("groups", "empty", None).is_configuration_error());
        assert!(!GitGroupError::internal_error("boom").is_configuration_error());
    }

    #[test]
    fn test_validation_error() {
        let error = GitGroupError::validation_error("groups", "must not be empty", None);
        assert_eq!(error.to_string(), "Validation error: groups - must not be empty");
    }

    #[test]
    fn test_error_conversion_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: GitGroupError = io_error.into();
        assert!(matches!(error, GitGroupError::FileSystemError { .. }));
    }

    #[test]
    fn test_error_conversion_from_config_store_error() {
        let error: GitGroupError =
            ConfigStoreError::ConfigFileNotFound("/tmp/missing.json".to_string()).into();
        if let GitGroupError::ConfigError { path: Some(p), .. } = error {
            assert_eq!(p, PathBuf::from("/tmp/missing.json"));
        } else {
            panic!("Expected ConfigError with path");
        }
    }
}
