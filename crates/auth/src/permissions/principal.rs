//! Principal types
//!
//! A principal is a named bearer of direct permission patterns, parent group
//! edges and an opaque data bag. Players are leaves keyed by their unique id;
//! groups are interior nodes and also track their children.
//!
//! Principals are owned by the [`Registry`](super::Registry). Parent and child
//! edges are [`PrincipalKey`]s into the same registry, never owning references.

use std::collections::HashMap;

use serde_json::Value;
use slotmap::new_key_type;

use super::matcher::PermissionPattern;

new_key_type! {
    /// Handle for a principal stored in the registry
    pub struct PrincipalKey;
}

/// Principal variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    /// Leaf principal identified by an external unique id
    Player,
    /// Administratively named group
    Group,
}

impl PrincipalKind {
    /// Lowercase label used in logs and command output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Group => "group",
        }
    }
}

/// A single principal record
#[derive(Debug, Clone)]
pub struct Principal {
    name: String,
    kind: PrincipalKind,
    /// Direct patterns with their compiled matchers, in insertion order
    patterns: Vec<PermissionPattern>,
    /// Parent groups, in insertion order
    pub(super) parents: Vec<PrincipalKey>,
    /// Inverse of `parents`; always empty on players
    pub(super) children: Vec<PrincipalKey>,
    data: HashMap<String, Value>,
}

impl Principal {
    pub(super) fn new(name: &str, kind: PrincipalKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            patterns: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            data: HashMap::new(),
        }
    }

    /// Principal name (unique id for players, group name for groups)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }

    pub fn is_group(&self) -> bool {
        self.kind == PrincipalKind::Group
    }

    /// Direct pattern strings, in insertion order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(PermissionPattern::as_str)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Check whether a direct pattern is present
    pub fn has_pattern(&self, pattern: &str) -> bool {
        self.patterns.iter().any(|p| p.as_str() == pattern)
    }

    /// Parent group keys, in insertion order
    pub fn parents(&self) -> &[PrincipalKey] {
        &self.parents
    }

    /// Child keys (groups only)
    pub fn children(&self) -> &[PrincipalKey] {
        &self.children
    }

    /// Returns true if any direct pattern matches `node`
    pub fn matches_directly(&self, node: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(node))
    }

    /// Own data value, ignoring parents
    pub fn own_data(&self, node: &str) -> Option<&Value> {
        self.data.get(node)
    }

    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    /// Insert a compiled pattern; returns false if already present
    pub(super) fn insert_pattern(&mut self, pattern: PermissionPattern) -> bool {
        if self.patterns.contains(&pattern) {
            return false;
        }
        self.patterns.push(pattern);
        true
    }

    /// Remove a pattern and its matcher; returns false if absent
    pub(super) fn remove_pattern(&mut self, pattern: &str) -> bool {
        let before = self.patterns.len();
        self.patterns.retain(|p| p.as_str() != pattern);
        self.patterns.len() != before
    }

    pub(super) fn set_data(&mut self, node: &str, value: Value) -> Option<Value> {
        self.data.insert(node.to_string(), value)
    }

    pub(super) fn remove_data(&mut self, node: &str) -> Option<Value> {
        self.data.remove(node)
    }
}

/// Insert `key` into an edge list unless present; returns true if inserted
pub(super) fn push_edge(edges: &mut Vec<PrincipalKey>, key: PrincipalKey) -> bool {
    if edges.contains(&key) {
        return false;
    }
    edges.push(key);
    true
}

/// Remove `key` from an edge list; returns true if removed
pub(super) fn drop_edge(edges: &mut Vec<PrincipalKey>, key: PrincipalKey) -> bool {
    let before = edges.len();
    edges.retain(|k| *k != key);
    edges.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_mirror() {
        let mut p = Principal::new("STEAM_1:0:1", PrincipalKind::Player);
        let pat = PermissionPattern::compile("admin.*").unwrap();

        assert!(p.insert_pattern(pat.clone()));
        assert!(!p.insert_pattern(pat));
        assert_eq!(p.pattern_count(), 1);
        assert!(p.matches_directly("admin.ban"));

        assert!(p.remove_pattern("admin.*"));
        assert!(!p.remove_pattern("admin.*"));
        assert_eq!(p.pattern_count(), 0);
        assert!(!p.matches_directly("admin.ban"));
    }

    #[test]
    fn test_data_bag() {
        let mut p = Principal::new("mods", PrincipalKind::Group);
        assert!(p.is_group());
        assert!(p.own_data("immunity").is_none());

        p.set_data("immunity", Value::from(50));
        assert_eq!(p.own_data("immunity"), Some(&Value::from(50)));
        assert_eq!(p.remove_data("immunity"), Some(Value::from(50)));
        assert!(p.data().is_empty());
    }

    #[test]
    fn test_kind_label() {
        assert_eq!(PrincipalKind::Player.label(), "player");
        assert_eq!(PrincipalKind::Group.label(), "group");
    }
}
