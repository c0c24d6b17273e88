//! Error types for the permission system

use std::path::PathBuf;

use crate::config::ConfigError;

/// Error type for permission registry and backend operations
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    /// A backend's medium could not be parsed
    #[error("Malformed permissions file {path:?}: {reason}")]
    MalformedConfig { path: PathBuf, reason: String },

    /// Backend name matches no registered backend
    #[error("Unknown permission backend: {0}")]
    UnknownBackend(String),

    /// Pattern string failed matcher compilation
    #[error("Invalid permission pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Removing a pattern the principal does not hold directly
    #[error("Permission '{pattern}' not found on '{principal}'")]
    PatternNotFound { principal: String, pattern: String },

    /// Removing a parent the principal does not inherit from
    #[error("Group '{parent}' is not a parent of '{principal}'")]
    ParentNotFound { principal: String, parent: String },

    /// Removing a data node the principal does not hold directly
    #[error("Data node '{node}' not found on '{principal}'")]
    DataNotFound { principal: String, node: String },

    /// A group listed itself as its own parent
    #[error("Group '{0}' cannot inherit from itself")]
    SelfParent(String),

    /// Filesystem access failed for a backend file
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Permission configuration document could not be loaded or saved
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PermissionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for the `NotFound` class of administrative errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PatternNotFound { .. } | Self::ParentNotFound { .. } | Self::DataNotFound { .. }
        )
    }
}

/// Result type for permission operations
pub type PermissionResult<T> = Result<T, PermissionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_class() {
        let err = PermissionError::PatternNotFound {
            principal: "mods".to_string(),
            pattern: "admin.kick".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!PermissionError::UnknownBackend("sql".to_string()).is_not_found());
    }

    #[test]
    fn test_malformed_message_names_path() {
        let err = PermissionError::MalformedConfig {
            path: PathBuf::from("/cfg/auth/admins.json"),
            reason: "expected value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Malformed permissions file"));
        assert!(msg.contains("admins.json"));
    }
}
