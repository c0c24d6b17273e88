//! Permission backends
//!
//! A backend populates the [`Registry`] from some external medium. Every
//! backend has a stable name and an option bag with defaults; the option
//! bags of all registered backends are merged into the permission config
//! document so their settings appear on first launch.
//!
//! The flat-file backend is always available. Additional backends are added
//! to a [`BackendCatalog`] with [`BackendCatalog::register`].
//!
//! # Example
//!
//! ```ignore
//! use cs2rust_auth::backends::{BackendOptions, LoadReport, PermissionBackend};
//! use cs2rust_auth::permissions::Registry;
//!
//! struct StaticBackend;
//!
//! impl PermissionBackend for StaticBackend {
//!     fn name(&self) -> &str {
//!         "static"
//!     }
//!
//!     fn default_options(&self, _config_dir: &Path) -> BackendOptions {
//!         BackendOptions::default()
//!     }
//!
//!     fn load(&self, registry: &mut Registry, _options: &BackendOptions) -> PermissionResult<LoadReport> {
//!         registry.player("STEAM_1:0:1").add("*")?;
//!         Ok(LoadReport::default())
//!     }
//! }
//! ```

mod flatfile;

use std::fmt;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::config::{ConfigError, ConfigResult};
use crate::error::{PermissionError, PermissionResult};
use crate::permissions::Registry;

pub use flatfile::{
    FlatFileBackend, ADMINS_FILE, ADMIN_CONFIG_KEY, FLATFILE_BACKEND, GROUPS_FILE,
    GROUP_CONFIG_KEY, SIMPLE_CONFIG_KEY, SIMPLE_FILE,
};

/// A loader that populates the registry from an external medium
pub trait PermissionBackend: Send + Sync {
    /// Stable backend name, matched case-insensitively
    fn name(&self) -> &str;

    /// Option bag defaults for a given config directory
    fn default_options(&self, config_dir: &Path) -> BackendOptions;

    /// Populate a freshly cleared registry.
    ///
    /// Malformed entries are recorded in the returned report and skipped.
    /// An `Err` means the load could not proceed at all.
    fn load(&self, registry: &mut Registry, options: &BackendOptions)
        -> PermissionResult<LoadReport>;
}

/// Per-entry problems absorbed during a load
#[derive(Debug, Default)]
pub struct LoadReport {
    diagnostics: Vec<PermissionError>,
}

impl LoadReport {
    /// Log a problem as a warning and keep it in the report
    pub fn warn(&mut self, error: PermissionError) {
        tracing::warn!("{}", error);
        self.diagnostics.push(error);
    }

    pub fn diagnostics(&self) -> &[PermissionError] {
        &self.diagnostics
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns true if a diagnostic was recorded for `path`
    pub fn mentions(&self, path: &Path) -> bool {
        self.diagnostics.iter().any(|d| match d {
            PermissionError::MalformedConfig { path: p, .. } | PermissionError::Io { path: p, .. } => {
                p == path
            }
            _ => false,
        })
    }
}

/// A backend's option bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendOptions(Table);

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, returning `self` for chaining
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String option; `Err` if present with another type
    pub fn get_str(&self, key: &str) -> ConfigResult<Option<&str>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(invalid(key, "string")),
        }
    }

    /// Boolean option; `Err` if present with another type
    pub fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(_) => Err(invalid(key, "boolean")),
        }
    }

    /// Path option; `Err` if missing or not a string
    pub fn require_path(&self, key: &str) -> ConfigResult<PathBuf> {
        self.get_str(key)?
            .map(PathBuf::from)
            .ok_or_else(|| invalid(key, "path string"))
    }

    pub fn into_table(self) -> Table {
        self.0
    }
}

fn invalid(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        expected,
    }
}

impl From<Table> for BackendOptions {
    fn from(table: Table) -> Self {
        Self(table)
    }
}

/// The set of backends available to the permission manager
#[derive(Default)]
pub struct BackendCatalog {
    backends: Vec<Box<dyn PermissionBackend>>,
}

impl BackendCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the built-in backends
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register(FlatFileBackend);
        catalog
    }

    /// Register a backend, replacing any existing backend with the same name
    pub fn register<B: PermissionBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if let Some(pos) = self
            .backends
            .iter()
            .position(|b| b.name().eq_ignore_ascii_case(&name))
        {
            tracing::warn!("Permission backend '{}' replaced", name);
            self.backends.remove(pos);
        }
        self.backends.push(Box::new(backend));
        tracing::debug!("Registered permission backend: {}", name);
    }

    /// Find a backend by case-insensitive name
    pub fn find(&self, name: &str) -> PermissionResult<&dyn PermissionBackend> {
        self.backends
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .map(|b| b.as_ref())
            .ok_or_else(|| PermissionError::UnknownBackend(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PermissionBackend> {
        self.backends.iter().map(|b| b.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Debug for BackendCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCatalog")
            .field("backends", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedBackend(&'static str);

    impl PermissionBackend for NamedBackend {
        fn name(&self) -> &str {
            self.0
        }

        fn default_options(&self, _config_dir: &Path) -> BackendOptions {
            BackendOptions::new().with("enabled", true)
        }

        fn load(
            &self,
            registry: &mut Registry,
            _options: &BackendOptions,
        ) -> PermissionResult<LoadReport> {
            registry.player(self.0).add("*")?;
            Ok(LoadReport::default())
        }
    }

    #[test]
    fn test_builtin_flatfile_present() {
        let catalog = BackendCatalog::with_builtins();
        assert_eq!(catalog.names(), vec![FLATFILE_BACKEND]);
        assert!(catalog.find("FLATFILE").is_ok());
    }

    #[test]
    fn test_unknown_backend() {
        let catalog = BackendCatalog::with_builtins();
        match catalog.find("mysql") {
            Err(PermissionError::UnknownBackend(name)) => assert_eq!(name, "mysql"),
            other => panic!("unexpected: {:?}", other.map(|b| b.name().to_string())),
        }
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut catalog = BackendCatalog::with_builtins();
        catalog.register(NamedBackend("static"));
        catalog.register(NamedBackend("Static"));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("static").unwrap().name(), "Static");
    }

    #[test]
    fn test_option_accessors() {
        let options = BackendOptions::new()
            .with("path", "/tmp/admins.json")
            .with("enabled", true)
            .with("retries", 3i64);

        assert_eq!(options.get_str("path").unwrap(), Some("/tmp/admins.json"));
        assert_eq!(options.get_bool("enabled").unwrap(), Some(true));
        assert!(options.get_str("retries").is_err());
        assert!(options.get_str("missing").unwrap().is_none());
        assert_eq!(
            options.require_path("path").unwrap(),
            PathBuf::from("/tmp/admins.json")
        );
        assert!(options.require_path("missing").is_err());
    }

    #[test]
    fn test_report_mentions_path() {
        let mut report = LoadReport::default();
        assert!(report.is_clean());

        report.warn(PermissionError::MalformedConfig {
            path: PathBuf::from("/cfg/admins.json"),
            reason: "expected value".to_string(),
        });
        assert!(!report.is_clean());
        assert!(report.mentions(Path::new("/cfg/admins.json")));
        assert!(!report.mentions(Path::new("/cfg/groups.json")));
    }
}
