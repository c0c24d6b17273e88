//! Permission manager - registry, backends and the active backend together

use std::path::{Path, PathBuf};

use super::principal::PrincipalKind;
use super::registry::{PrincipalMut, Registry};
use crate::backends::{BackendCatalog, BackendOptions, LoadReport, PermissionBackend};
use crate::config::{merge_defaults, ConfigError, PermissionsConfig};
use crate::error::PermissionResult;
use crate::identity::IdentityResolver;

/// Owns the registry and drives backend loads
///
/// At most one backend is active at a time. Switching backends clears the
/// registry and loads the new backend into it; there is no rollback, so a
/// failed load leaves the registry empty.
#[derive(Debug, Default)]
pub struct PermissionManager {
    registry: Registry,
    catalog: BackendCatalog,
    config_dir: Option<PathBuf>,
    config: Option<PermissionsConfig>,
    active_backend: Option<String>,
}

impl PermissionManager {
    /// A manager with the built-in backends and no config directory yet
    pub fn new() -> Self {
        Self::with_catalog(BackendCatalog::with_builtins())
    }

    pub fn with_catalog(catalog: BackendCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Add a backend to the catalog
    ///
    /// Its option defaults are merged into the config document on the next
    /// [`init`](Self::init) or [`reload`](Self::reload).
    pub fn register_backend<B: PermissionBackend + 'static>(&mut self, backend: B) {
        self.catalog.register(backend);
    }

    pub fn catalog(&self) -> &BackendCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn config(&self) -> Option<&PermissionsConfig> {
        self.config.as_ref()
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Name of the active backend, if a load has succeeded or is in progress
    pub fn active_backend(&self) -> Option<&str> {
        self.active_backend.as_deref()
    }

    /// Load the config document from `config_dir` and activate the
    /// configured backend
    pub fn init(&mut self, config_dir: &Path) -> PermissionResult<LoadReport> {
        self.config_dir = Some(config_dir.to_path_buf());
        self.reload()
    }

    /// Re-read the config document and reload the configured backend
    pub fn reload(&mut self) -> PermissionResult<LoadReport> {
        let config = self.load_config()?;
        let name = config.backend_name()?.to_string();
        self.config = Some(config);
        self.load_backend(&name)
    }

    /// Switch to the backend `name` and persist the choice in the config
    /// document
    pub fn select_backend(&mut self, name: &str) -> PermissionResult<LoadReport> {
        let report = self.load_backend(name)?;

        if let (Some(config), Some(active)) = (self.config.as_mut(), self.active_backend.as_deref()) {
            config.set_backend_name(active);
            config.save()?;
        }
        Ok(report)
    }

    /// Activate the backend `name`.
    ///
    /// The registry is cleared before the backend loads. An unknown name or
    /// a fatal load error leaves the registry empty and no backend active.
    pub fn load_backend(&mut self, name: &str) -> PermissionResult<LoadReport> {
        self.active_backend = None;
        self.registry.clear();

        let backend = match self.catalog.find(name) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!("{} (available: {:?})", e, self.catalog.names());
                return Err(e);
            }
        };

        let config_dir = self
            .config_dir
            .as_deref()
            .ok_or(ConfigError::NoConfigDirectory)?;

        let mut options = self
            .config
            .as_ref()
            .map(|c| c.backend_options(backend.name()))
            .unwrap_or_default()
            .into_table();
        merge_defaults(
            &mut options,
            backend.default_options(config_dir).into_table(),
        );
        let options = BackendOptions::from(options);

        self.active_backend = Some(backend.name().to_string());
        tracing::info!("Loading permissions from backend '{}'", backend.name());

        match backend.load(&mut self.registry, &options) {
            Ok(report) => {
                tracing::info!(
                    "Permission backend '{}' loaded: {} players, {} groups, {} warnings",
                    backend.name(),
                    self.registry.player_count(),
                    self.registry.group_count(),
                    report.diagnostics().len()
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Permission backend '{}' failed to load: {}", backend.name(), e);
                self.registry.clear();
                self.active_backend = None;
                Err(e)
            }
        }
    }

    fn load_config(&self) -> PermissionResult<PermissionsConfig> {
        let config_dir = self
            .config_dir
            .as_deref()
            .ok_or(ConfigError::NoConfigDirectory)?;
        Ok(PermissionsConfig::load_or_create(config_dir, &self.catalog)?)
    }

    /// Get-or-create the player bound to a session slot
    ///
    /// Returns `None` if the resolver has no unique id for `slot`.
    pub fn get_player_permissions(
        &mut self,
        slot: i32,
        resolver: &dyn IdentityResolver,
    ) -> Option<PrincipalMut<'_>> {
        let unique_id = resolver.unique_id(slot)?;
        Some(self.registry.player(&unique_id))
    }

    /// Get-or-create a group by name
    pub fn get_group_permissions(&mut self, name: &str) -> PrincipalMut<'_> {
        self.registry.group(name)
    }

    /// Get-or-create a principal of either kind
    pub fn principal(&mut self, kind: PrincipalKind, name: &str) -> PrincipalMut<'_> {
        self.registry.entry(kind, name)
    }
}
