//! Permission configuration document
//!
//! A single TOML document selects the active permission backend and carries
//! the option bag of every known backend:
//!
//! ```toml
//! [Config]
//! PermissionBackend = "flatfile"
//!
//! [backends.flatfile]
//! admin_config_path = "<config_dir>/auth/admins.json"
//! group_config_path = "<config_dir>/auth/groups.json"
//! simple_config_path = "<config_dir>/auth/simple.txt"
//! ```
//!
//! On load, defaults for the `[Config]` section and for every registered
//! backend are merged beneath the values already on disk, and the merged
//! document is written back. Unknown keys are kept, so options of backends
//! that are not compiled in survive a round-trip. The document is only
//! rewritten when its bytes change.

mod loader;

use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::backends::{BackendCatalog, BackendOptions};

pub use loader::{
    auth_dir, configs_dir, cs2rust_base_dir, permissions_config_path, AUTH_DIR,
    PERMISSIONS_CONFIG_FILE,
};

/// Section holding core settings
pub const CONFIG_SECTION: &str = "Config";

/// Key selecting the active backend
pub const BACKEND_KEY: &str = "PermissionBackend";

/// Section holding one sub-table of options per backend
pub const BACKENDS_SECTION: &str = "backends";

/// Backend used when the document does not name one
pub const DEFAULT_BACKEND: &str = "flatfile";

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine config directory from binary location
    #[error("Config directory not available - could not resolve base path")]
    NoConfigDirectory,

    /// A key holds a value of the wrong type
    #[error("Invalid value for '{key}': expected {expected}")]
    InvalidValue { key: String, expected: &'static str },
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// The merged permission configuration document
#[derive(Debug, Clone)]
pub struct PermissionsConfig {
    path: PathBuf,
    document: Table,
}

impl PermissionsConfig {
    /// Default document for `config_dir` and the backends in `catalog`
    pub fn defaults(config_dir: &Path, catalog: &BackendCatalog) -> Table {
        let mut core = Table::new();
        core.insert(
            BACKEND_KEY.to_string(),
            Value::String(DEFAULT_BACKEND.to_string()),
        );

        let mut backends = Table::new();
        for backend in catalog.iter() {
            backends.insert(
                backend.name().to_string(),
                Value::Table(backend.default_options(config_dir).into_table()),
            );
        }

        let mut document = Table::new();
        document.insert(CONFIG_SECTION.to_string(), Value::Table(core));
        document.insert(BACKENDS_SECTION.to_string(), Value::Table(backends));
        document
    }

    /// Load the document, merge in defaults and persist the result.
    ///
    /// If the file doesn't exist, the defaults are written. A document that
    /// fails to parse is reported and left untouched on disk.
    pub fn load_or_create(config_dir: &Path, catalog: &BackendCatalog) -> ConfigResult<Self> {
        let path = permissions_config_path(config_dir);

        let (mut document, original) = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let document: Table = toml::from_str(&content)?;
            tracing::debug!("Loaded permissions config from {:?}", path);
            (document, Some(content))
        } else {
            (Table::new(), None)
        };

        merge_defaults(&mut document, Self::defaults(config_dir, catalog));

        let config = Self { path, document };
        let merged = config.to_toml_string()?;
        if original.as_deref() != Some(merged.as_str()) {
            config.write(&merged)?;
            if original.is_none() {
                tracing::info!("Created default permissions config at {:?}", config.path);
            } else {
                tracing::info!("Updated permissions config at {:?}", config.path);
            }
        }

        Ok(config)
    }

    /// Build a config from an in-memory document without touching disk
    pub fn from_table(path: impl Into<PathBuf>, document: Table) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }

    /// Path the document is persisted to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full merged document
    pub fn document(&self) -> &Table {
        &self.document
    }

    /// Name of the configured backend
    pub fn backend_name(&self) -> ConfigResult<&str> {
        match self
            .document
            .get(CONFIG_SECTION)
            .and_then(|v| v.as_table())
            .and_then(|t| t.get(BACKEND_KEY))
        {
            None => Ok(DEFAULT_BACKEND),
            Some(Value::String(name)) => Ok(name.as_str()),
            Some(_) => Err(ConfigError::InvalidValue {
                key: format!("{}.{}", CONFIG_SECTION, BACKEND_KEY),
                expected: "string",
            }),
        }
    }

    /// Select a different backend (in memory; call [`save`](Self::save) to persist)
    pub fn set_backend_name(&mut self, name: &str) {
        if !matches!(self.document.get(CONFIG_SECTION), Some(Value::Table(_))) {
            self.document
                .insert(CONFIG_SECTION.to_string(), Value::Table(Table::new()));
        }
        if let Some(Value::Table(core)) = self.document.get_mut(CONFIG_SECTION) {
            core.insert(BACKEND_KEY.to_string(), Value::String(name.to_string()));
        }
    }

    /// Option bag for a backend, matched case-insensitively
    ///
    /// Returns an empty bag when the document has no section for it.
    pub fn backend_options(&self, name: &str) -> BackendOptions {
        self.document
            .get(BACKENDS_SECTION)
            .and_then(|v| v.as_table())
            .and_then(|backends| {
                backends
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .and_then(|(_, v)| v.as_table())
            })
            .cloned()
            .map(BackendOptions::from)
            .unwrap_or_default()
    }

    /// Save the document to its path.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.to_toml_string()?;
        self.write(&content)?;
        tracing::debug!("Saved permissions config to {:?}", self.path);
        Ok(())
    }

    fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(&self.document)?)
    }

    fn write(&self, content: &str) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Insert every key of `defaults` missing from `target`, recursing into
/// tables present on both sides. Values already in `target` win.
pub fn merge_defaults(target: &mut Table, defaults: Table) {
    for (key, default) in defaults {
        match target.get_mut(&key) {
            Some(Value::Table(existing)) => {
                if let Value::Table(default) = default {
                    merge_defaults(existing, default);
                }
            }
            Some(_) => {}
            None => {
                target.insert(key, default);
            }
        }
    }
}
