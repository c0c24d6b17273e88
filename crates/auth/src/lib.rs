//! CS2 Rust Auth - Permission Core
//!
//! This crate answers whether a player or group holds a permission node.
//! Permissions are dotted nodes with `*` wildcards, principals inherit from
//! parent groups, and a pluggable backend loads everything from disk.
//!
//! # Modules
//!
//! - [`permissions`] - matcher, principals, registry and the process-wide API
//! - [`backends`] - backend trait, catalog and the flat-file backend
//! - [`config`] - the `auth/permissions.ini` document
//! - [`commands`] - console/chat commands, including reload and query
//! - [`identity`] - session slot to unique id resolution

pub mod backends;
pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod permissions;

// Re-export commonly used items
pub use backends::{BackendCatalog, BackendOptions, FlatFileBackend, LoadReport, PermissionBackend};
pub use commands::{
    dispatch_chat, dispatch_command, register_command, register_command_ex,
    register_permission_commands, register_server_command, unregister_command, CommandContext,
    CommandInfo, CommandKey, CommandOutput, CommandResult,
};
pub use config::{ConfigError, ConfigResult, PermissionsConfig};
pub use error::{PermissionError, PermissionResult};
pub use identity::{IdentityResolver, SlotTable};

// Re-export permission types and functions
pub use permissions::{
    // Lifecycle
    active_backend, init, load_backend, register_backend, reload, select_backend,
    // Mutation
    add_parent, add_permission, remove_parent, remove_permission,
    // Query
    get_group_permissions, get_permissions, get_player_data, get_player_permissions,
    group_has_permission, has_all_permissions, has_any_permission, has_permission, is_registered,
    slot_has_permission,
    // Types
    PermissionManager, PermissionPattern, PrincipalKind, Registry,
};

/// Shutdown the permission core
///
/// Drops every principal. Called by the host when it unloads.
pub fn shutdown() {
    tracing::info!("CS2Rust auth shutting down...");
    permissions::with_registry_mut(|r| r.clear());
}
