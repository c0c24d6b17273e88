//! Permission system for CS2Rust
//!
//! This module answers one question at runtime: does principal P hold
//! permission node N? Principals are players (keyed by unique id) and groups
//! (keyed by name). Each holds direct permission patterns and may inherit
//! from parent groups, which may inherit in turn.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  PermissionManager                       │
//! │  ┌─────────────────────────────────────────────────┐    │
//! │  │   Registry (SlotMap<PrincipalKey, Principal>)    │    │
//! │  │   players: unique id → key                       │    │
//! │  │   groups:  name      → key                       │    │
//! │  └─────────────────────────────────────────────────┘    │
//! │       ▲ clear + load            │ query                  │
//! │       │                         ▼                        │
//! │  ┌────┴──────────┐        ┌───────────┐                  │
//! │  │ Active backend│        │ Commands  │                  │
//! │  │ (flatfile)    │        │ (checks)  │                  │
//! │  └───────────────┘        └───────────┘                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Permission Format
//!
//! Permissions are dotted nodes such as `admin.ban.temp`. Principals hold
//! patterns, where `*` matches any run of characters including dots:
//! - `admin.ban.temp` - exactly that node
//! - `admin.ban.*` - every node under `admin.ban.`
//! - `*` - everything
//!
//! # Usage
//!
//! ```ignore
//! use cs2rust_auth::permissions::{has_permission, init};
//!
//! init(&config_dir)?;
//!
//! if has_permission("STEAM_1:0:12345", "admin.ban.temp") {
//!     // Perform ban
//! }
//! ```

mod manager;
mod matcher;
mod principal;
mod registry;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::backends::{LoadReport, PermissionBackend};
use crate::error::PermissionResult;
use crate::identity::IdentityResolver;

pub use manager::PermissionManager;
pub use matcher::{PermissionPattern, RESERVED_CHARS, WILDCARD, WILDCARD_ALL};
pub use principal::{Principal, PrincipalKey, PrincipalKind};
pub use registry::{PrincipalMut, PrincipalRef, Registry};

/// Process-wide permission manager
static PERMISSIONS: LazyLock<RwLock<PermissionManager>> =
    LazyLock::new(|| RwLock::new(PermissionManager::new()));

// ============================================================================
// Lifecycle APIs
// ============================================================================

/// Load the config document from `config_dir` and activate the configured
/// backend
pub fn init(config_dir: &Path) -> PermissionResult<LoadReport> {
    PERMISSIONS.write().init(config_dir)
}

/// Re-read the config document and reload the configured backend
pub fn reload() -> PermissionResult<LoadReport> {
    PERMISSIONS.write().reload()
}

/// Activate a backend by name without changing the config document
pub fn load_backend(name: &str) -> PermissionResult<LoadReport> {
    PERMISSIONS.write().load_backend(name)
}

/// Activate a backend by name and persist it as the configured backend
pub fn select_backend(name: &str) -> PermissionResult<LoadReport> {
    PERMISSIONS.write().select_backend(name)
}

/// Register an additional backend
pub fn register_backend<B: PermissionBackend + 'static>(backend: B) {
    PERMISSIONS.write().register_backend(backend);
}

/// Name of the active backend
pub fn active_backend() -> Option<String> {
    PERMISSIONS.read().active_backend().map(str::to_string)
}

/// Names of all registered backends
pub fn backend_names() -> Vec<String> {
    PERMISSIONS
        .read()
        .catalog()
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Run `f` with shared access to the registry
pub fn with_registry<R>(f: impl FnOnce(&Registry) -> R) -> R {
    f(PERMISSIONS.read().registry())
}

/// Run `f` with exclusive access to the registry
pub fn with_registry_mut<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    f(PERMISSIONS.write().registry_mut())
}

// ============================================================================
// Mutation APIs
// ============================================================================

/// Add a direct pattern to a principal, creating the principal if needed
///
/// # Example
/// ```ignore
/// add_permission(PrincipalKind::Group, "mods", "admin.kick.*")?;
/// ```
pub fn add_permission(kind: PrincipalKind, name: &str, pattern: &str) -> PermissionResult<bool> {
    with_registry_mut(|r| r.entry(kind, name).add(pattern))
}

/// Remove a direct pattern from a principal
pub fn remove_permission(kind: PrincipalKind, name: &str, pattern: &str) -> PermissionResult<()> {
    with_registry_mut(|r| r.entry(kind, name).remove(pattern))
}

/// Make a principal inherit from group `parent`
pub fn add_parent(kind: PrincipalKind, name: &str, parent: &str) -> PermissionResult<bool> {
    with_registry_mut(|r| r.entry(kind, name).add_parent(parent))
}

/// Stop a principal inheriting from group `parent`
pub fn remove_parent(kind: PrincipalKind, name: &str, parent: &str) -> PermissionResult<()> {
    with_registry_mut(|r| r.entry(kind, name).remove_parent(parent))
}

// ============================================================================
// Query APIs
// ============================================================================

/// Check if a player holds a permission node, directly or through groups
///
/// Unknown players hold nothing.
pub fn has_permission(unique_id: &str, node: &str) -> bool {
    with_registry(|r| {
        r.find_player(unique_id)
            .map(|p| p.contains(node))
            .unwrap_or(false)
    })
}

/// Check if a player holds any of the given nodes
pub fn has_any_permission(unique_id: &str, nodes: &[&str]) -> bool {
    with_registry(|r| {
        r.find_player(unique_id)
            .map(|p| p.has_any(nodes))
            .unwrap_or(false)
    })
}

/// Check if a player holds all of the given nodes
pub fn has_all_permissions(unique_id: &str, nodes: &[&str]) -> bool {
    with_registry(|r| {
        r.find_player(unique_id)
            .map(|p| p.has_all(nodes))
            .unwrap_or(false)
    })
}

/// Check if a group holds a permission node
pub fn group_has_permission(name: &str, node: &str) -> bool {
    with_registry(|r| {
        r.find_group(name)
            .map(|g| g.contains(node))
            .unwrap_or(false)
    })
}

/// Transitive permission patterns of a player
pub fn get_permissions(unique_id: &str) -> BTreeSet<String> {
    with_registry(|r| {
        r.find_player(unique_id)
            .map(|p| p.list_permissions())
            .unwrap_or_default()
    })
}

/// Transitive permission patterns of a group
pub fn get_group_permissions(name: &str) -> BTreeSet<String> {
    with_registry(|r| {
        r.find_group(name)
            .map(|g| g.list_permissions())
            .unwrap_or_default()
    })
}

/// Data value of a player, falling back to its groups
pub fn get_player_data(unique_id: &str, node: &str) -> Option<Value> {
    with_registry(|r| {
        r.find_player(unique_id)
            .and_then(|p| p.get_data(node).cloned())
    })
}

/// Transitive permission patterns of the player in a session slot
///
/// Returns `None` if the slot has no unique id.
pub fn get_player_permissions(slot: i32, resolver: &dyn IdentityResolver) -> Option<BTreeSet<String>> {
    let unique_id = resolver.unique_id(slot)?;
    Some(get_permissions(&unique_id))
}

/// Check if the player in a session slot holds a permission node
pub fn slot_has_permission(slot: i32, resolver: &dyn IdentityResolver, node: &str) -> bool {
    resolver
        .unique_id(slot)
        .map(|id| has_permission(&id, node))
        .unwrap_or(false)
}

/// Check if a player exists in the registry
pub fn is_registered(unique_id: &str) -> bool {
    with_registry(|r| r.find_player(unique_id).is_some())
}

/// Number of players and groups in the registry
pub fn principal_count() -> (usize, usize) {
    with_registry(|r| (r.player_count(), r.group_count()))
}
