//! Principal registry - keyed storage for players and groups
//!
//! The registry owns every principal in a single slot map and exposes two
//! name indexes over it, one per store. Lookups through [`Registry::player`]
//! and [`Registry::group`] create the principal on a miss, so backends can
//! write `registry.group("mods").add("admin.kick.*")` without checking for
//! existence first.
//!
//! Graph queries (`contains`, `list_permissions`, `get_data`) walk parent
//! edges depth-first in insertion order and keep a visited set, so they
//! terminate on cyclic group graphs.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;
use slotmap::SlotMap;

use super::matcher::PermissionPattern;
use super::principal::{drop_edge, push_edge, Principal, PrincipalKey, PrincipalKind};
use crate::error::{PermissionError, PermissionResult};

/// Keyed stores for players and groups
#[derive(Debug, Default)]
pub struct Registry {
    principals: SlotMap<PrincipalKey, Principal>,
    players: HashMap<String, PrincipalKey>,
    groups: HashMap<String, PrincipalKey>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self, kind: PrincipalKind) -> &HashMap<String, PrincipalKey> {
        match kind {
            PrincipalKind::Player => &self.players,
            PrincipalKind::Group => &self.groups,
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Get-or-create a principal in the given store
    pub fn get_or_create(&mut self, kind: PrincipalKind, name: &str) -> PrincipalKey {
        let store = match kind {
            PrincipalKind::Player => &mut self.players,
            PrincipalKind::Group => &mut self.groups,
        };

        if let Some(key) = store.get(name) {
            return *key;
        }

        let key = self.principals.insert(Principal::new(name, kind));
        store.insert(name.to_string(), key);
        tracing::debug!("Created {} '{}'", kind.label(), name);
        key
    }

    /// Look up a principal without creating it
    pub fn find(&self, kind: PrincipalKind, name: &str) -> Option<PrincipalKey> {
        self.store(kind).get(name).copied()
    }

    /// Get-or-create a principal and return a mutable handle to it
    pub fn entry(&mut self, kind: PrincipalKind, name: &str) -> PrincipalMut<'_> {
        let key = self.get_or_create(kind, name);
        PrincipalMut {
            registry: self,
            key,
        }
    }

    /// Get-or-create a player by unique id
    pub fn player(&mut self, name: &str) -> PrincipalMut<'_> {
        self.entry(PrincipalKind::Player, name)
    }

    /// Get-or-create a group by name
    pub fn group(&mut self, name: &str) -> PrincipalMut<'_> {
        self.entry(PrincipalKind::Group, name)
    }

    /// Read-only view of an existing player
    pub fn find_player(&self, name: &str) -> Option<PrincipalRef<'_>> {
        self.find(PrincipalKind::Player, name)
            .map(|key| PrincipalRef {
                registry: self,
                key,
            })
    }

    /// Read-only view of an existing group
    pub fn find_group(&self, name: &str) -> Option<PrincipalRef<'_>> {
        self.find(PrincipalKind::Group, name)
            .map(|key| PrincipalRef {
                registry: self,
                key,
            })
    }

    /// Read-only view by key; `None` for keys invalidated by [`clear`](Self::clear)
    pub fn view(&self, key: PrincipalKey) -> Option<PrincipalRef<'_>> {
        self.principals.contains_key(key).then_some(PrincipalRef {
            registry: self,
            key,
        })
    }

    /// Mutable handle by key
    pub fn view_mut(&mut self, key: PrincipalKey) -> Option<PrincipalMut<'_>> {
        if self.principals.contains_key(key) {
            Some(PrincipalMut {
                registry: self,
                key,
            })
        } else {
            None
        }
    }

    pub fn get(&self, key: PrincipalKey) -> Option<&Principal> {
        self.principals.get(key)
    }

    /// Player unique ids
    pub fn player_names(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }

    /// Group names
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    /// Drop every principal in both stores
    ///
    /// Invalidates all outstanding [`PrincipalKey`]s.
    pub fn clear(&mut self) {
        self.principals.clear();
        self.players.clear();
        self.groups.clear();
    }

    // ========================================================================
    // Graph queries
    // ========================================================================

    /// Visit `key` and its transitive parents depth-first, parents in
    /// insertion order, each principal at most once. Stops early when `visit`
    /// returns `Some`.
    fn walk<'a, T>(
        &'a self,
        key: PrincipalKey,
        mut visit: impl FnMut(PrincipalKey, &'a Principal) -> Option<T>,
    ) -> Option<T> {
        let mut visited = HashSet::new();
        let mut stack = vec![key];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(principal) = self.principals.get(current) else {
                continue;
            };
            if let Some(found) = visit(current, principal) {
                return Some(found);
            }
            stack.extend(principal.parents.iter().rev().copied());
        }

        None
    }

    /// Check whether the principal or any transitive parent grants `node`
    pub fn contains(&self, key: PrincipalKey, node: &str) -> bool {
        self.walk(key, |_, p| p.matches_directly(node).then_some(()))
            .is_some()
    }

    /// Union of direct patterns across the principal and all transitive parents
    pub fn list_permissions(&self, key: PrincipalKey) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.walk::<()>(key, |_, p| {
            out.extend(p.patterns().map(str::to_string));
            None
        });
        out
    }

    /// Own data value, else the first value found depth-first in the parents
    pub fn get_data(&self, key: PrincipalKey, node: &str) -> Option<&Value> {
        self.walk(key, |_, p| p.own_data(node))
    }

    /// Transitive parents, not including the principal itself
    pub fn transitive_parents(&self, key: PrincipalKey) -> Vec<PrincipalKey> {
        let mut out = Vec::new();
        self.walk::<()>(key, |k, _| {
            if k != key {
                out.push(k);
            }
            None
        });
        out
    }

    fn name_of(&self, key: PrincipalKey) -> &str {
        self.principals.get(key).map(Principal::name).unwrap_or("")
    }

    fn names_of(&self, keys: &[PrincipalKey]) -> Vec<&str> {
        keys.iter().map(|k| self.name_of(*k)).collect()
    }
}

/// Read-only handle to a principal
#[derive(Clone, Copy)]
pub struct PrincipalRef<'a> {
    registry: &'a Registry,
    key: PrincipalKey,
}

impl<'a> PrincipalRef<'a> {
    pub fn key(&self) -> PrincipalKey {
        self.key
    }

    fn principal(&self) -> &'a Principal {
        &self.registry.principals[self.key]
    }

    pub fn name(&self) -> &'a str {
        self.principal().name()
    }

    pub fn kind(&self) -> PrincipalKind {
        self.principal().kind()
    }

    /// Direct pattern strings
    pub fn patterns(&self) -> Vec<&'a str> {
        self.principal().patterns().collect()
    }

    /// Parent group names, in insertion order
    pub fn parents(&self) -> Vec<&'a str> {
        self.registry.names_of(self.principal().parents())
    }

    /// Child names (groups only), in insertion order
    pub fn children(&self) -> Vec<&'a str> {
        self.registry.names_of(self.principal().children())
    }

    pub fn contains(&self, node: &str) -> bool {
        self.registry.contains(self.key, node)
    }

    /// Returns true if any of `nodes` is granted
    pub fn has_any(&self, nodes: &[&str]) -> bool {
        nodes.iter().any(|n| self.contains(n))
    }

    /// Returns true if every one of `nodes` is granted
    pub fn has_all(&self, nodes: &[&str]) -> bool {
        nodes.iter().all(|n| self.contains(n))
    }

    pub fn list_permissions(&self) -> BTreeSet<String> {
        self.registry.list_permissions(self.key)
    }

    pub fn get_data(&self, node: &str) -> Option<&'a Value> {
        self.registry.get_data(self.key, node)
    }
}

/// Mutable handle to a principal
///
/// Holds the registry borrow, so the key stays valid for the handle's lifetime.
pub struct PrincipalMut<'a> {
    registry: &'a mut Registry,
    key: PrincipalKey,
}

impl<'a> PrincipalMut<'a> {
    pub fn key(&self) -> PrincipalKey {
        self.key
    }

    /// Reborrow as a read-only handle
    pub fn view(&self) -> PrincipalRef<'_> {
        PrincipalRef {
            registry: &*self.registry,
            key: self.key,
        }
    }

    fn principal_mut(&mut self) -> &mut Principal {
        &mut self.registry.principals[self.key]
    }

    pub fn name(&self) -> &str {
        self.view().name()
    }

    /// Add a direct pattern
    ///
    /// Returns `Ok(false)` if the pattern was already present.
    pub fn add(&mut self, pattern: &str) -> PermissionResult<bool> {
        let compiled = PermissionPattern::compile(pattern)?;
        Ok(self.principal_mut().insert_pattern(compiled))
    }

    /// Remove a direct pattern
    pub fn remove(&mut self, pattern: &str) -> PermissionResult<()> {
        if self.principal_mut().remove_pattern(pattern) {
            Ok(())
        } else {
            Err(PermissionError::PatternNotFound {
                principal: self.name().to_string(),
                pattern: pattern.to_string(),
            })
        }
    }

    /// Remove every direct pattern, keeping edges and data
    pub fn clear_permissions(&mut self) {
        let patterns: Vec<String> = self.view().patterns().into_iter().map(String::from).collect();
        for pattern in patterns {
            self.principal_mut().remove_pattern(&pattern);
        }
    }

    /// Inherit from group `name`, creating the group if needed
    ///
    /// Installs both the parent edge and the child back-edge. Returns
    /// `Ok(false)` if the edge already existed.
    pub fn add_parent(&mut self, name: &str) -> PermissionResult<bool> {
        let parent = self.registry.get_or_create(PrincipalKind::Group, name);
        if parent == self.key {
            return Err(PermissionError::SelfParent(name.to_string()));
        }

        let child = self.key;
        let added = push_edge(&mut self.registry.principals[child].parents, parent);
        if added {
            push_edge(&mut self.registry.principals[parent].children, child);
        }
        Ok(added)
    }

    /// Stop inheriting from group `name`, removing both edges
    pub fn remove_parent(&mut self, name: &str) -> PermissionResult<()> {
        let child = self.key;
        let removed = match self.registry.find(PrincipalKind::Group, name) {
            Some(parent) => {
                let removed = drop_edge(&mut self.registry.principals[child].parents, parent);
                if removed {
                    drop_edge(&mut self.registry.principals[parent].children, child);
                }
                removed
            }
            None => false,
        };

        if removed {
            Ok(())
        } else {
            Err(PermissionError::ParentNotFound {
                principal: self.name().to_string(),
                parent: name.to_string(),
            })
        }
    }

    /// Set a value in the principal's own data bag, returning the previous value
    pub fn set_data(&mut self, node: &str, value: Value) -> Option<Value> {
        self.principal_mut().set_data(node, value)
    }

    /// Remove a value from the principal's own data bag
    pub fn remove_data(&mut self, node: &str) -> PermissionResult<Value> {
        match self.principal_mut().remove_data(node) {
            Some(value) => Ok(value),
            None => Err(PermissionError::DataNotFound {
                principal: self.name().to_string(),
                node: node.to_string(),
            }),
        }
    }

    pub fn contains(&self, node: &str) -> bool {
        self.registry.contains(self.key, node)
    }

    pub fn list_permissions(&self) -> BTreeSet<String> {
        self.registry.list_permissions(self.key)
    }

    pub fn get_data(&self, node: &str) -> Option<&Value> {
        self.registry.get_data(self.key, node)
    }
}
