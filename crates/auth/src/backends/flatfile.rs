//! Flat-file permission backend
//!
//! Reads three files from the auth config directory:
//!
//! | File          | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | `admins.json` | `{ "<unique id>": { "permissions": [..], "parents": [..] } }` |
//! | `groups.json` | same shape, keyed by group name                               |
//! | `simple.txt`  | one unique id per line, each granted `*`                      |
//!
//! Entries may also carry a `"data"` object whose values are copied into the
//! principal's data bag. Other fields are ignored. Missing files are created
//! empty. A file that fails to parse is skipped with a warning, as is any
//! single entry or pattern that is malformed.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{BackendOptions, LoadReport, PermissionBackend};
use crate::config::auth_dir;
use crate::error::{PermissionError, PermissionResult};
use crate::permissions::{PrincipalKind, Registry, WILDCARD_ALL};

/// Backend name
pub const FLATFILE_BACKEND: &str = "flatfile";

/// Option key for the player permissions file
pub const ADMIN_CONFIG_KEY: &str = "admin_config_path";
/// Option key for the group permissions file
pub const GROUP_CONFIG_KEY: &str = "group_config_path";
/// Option key for the superuser list
pub const SIMPLE_CONFIG_KEY: &str = "simple_config_path";

pub const ADMINS_FILE: &str = "admins.json";
pub const GROUPS_FILE: &str = "groups.json";
pub const SIMPLE_FILE: &str = "simple.txt";

/// Contents written to a missing JSON file
const EMPTY_JSON: &str = "{}\n";

/// One entry of `admins.json` / `groups.json`
///
/// Fields stay untyped so a bad field, or a bad element of a list, is
/// reported and skipped without losing the rest of the entry.
#[derive(Debug, Default, Deserialize)]
struct NodeEntry {
    #[serde(default)]
    permissions: Value,
    #[serde(default)]
    parents: Value,
    #[serde(default)]
    data: Value,
}

/// Backend reading JSON and text files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatFileBackend;

impl PermissionBackend for FlatFileBackend {
    fn name(&self) -> &str {
        FLATFILE_BACKEND
    }

    fn default_options(&self, config_dir: &Path) -> BackendOptions {
        let dir = auth_dir(config_dir);
        let path = |file: &str| dir.join(file).to_string_lossy().into_owned();

        BackendOptions::new()
            .with(ADMIN_CONFIG_KEY, path(ADMINS_FILE))
            .with(GROUP_CONFIG_KEY, path(GROUPS_FILE))
            .with(SIMPLE_CONFIG_KEY, path(SIMPLE_FILE))
    }

    fn load(
        &self,
        registry: &mut Registry,
        options: &BackendOptions,
    ) -> PermissionResult<LoadReport> {
        let admins = options.require_path(ADMIN_CONFIG_KEY)?;
        let groups = options.require_path(GROUP_CONFIG_KEY)?;
        let simple = options.require_path(SIMPLE_CONFIG_KEY)?;

        let mut report = LoadReport::default();
        load_entries(registry, PrincipalKind::Player, &admins, &mut report);
        load_entries(registry, PrincipalKind::Group, &groups, &mut report);
        load_simple(registry, &simple, &mut report);

        tracing::debug!(
            "Flat-file load finished: {} players, {} groups, {} warnings",
            registry.player_count(),
            registry.group_count(),
            report.diagnostics().len()
        );
        Ok(report)
    }
}

/// Read `path`, creating it with `default` if it doesn't exist
fn read_or_create(path: &Path, default: &str) -> PermissionResult<String> {
    if path.exists() {
        return std::fs::read_to_string(path).map_err(|e| PermissionError::io(path, e));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PermissionError::io(parent, e))?;
    }
    std::fs::write(path, default).map_err(|e| PermissionError::io(path, e))?;
    tracing::info!("Created empty permissions file at {:?}", path);
    Ok(default.to_string())
}

fn malformed(path: &Path, reason: impl Into<String>) -> PermissionError {
    PermissionError::MalformedConfig {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn load_entries(registry: &mut Registry, kind: PrincipalKind, path: &Path, report: &mut LoadReport) {
    let content = match read_or_create(path, EMPTY_JSON) {
        Ok(content) => content,
        Err(e) => return report.warn(e),
    };

    let entries: Map<String, Value> = match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => return report.warn(malformed(path, e.to_string())),
    };

    for (raw_name, value) in entries {
        let name = raw_name.trim();
        if name.is_empty() {
            report.warn(malformed(path, "entry with an empty name"));
            continue;
        }

        let entry: NodeEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                report.warn(malformed(path, format!("entry '{}': {}", name, e)));
                continue;
            }
        };

        let permissions = string_list(path, name, "permissions", entry.permissions, report);
        let parents = string_list(path, name, "parents", entry.parents, report);
        let data = match entry.data {
            Value::Null => Map::new(),
            Value::Object(data) => data,
            _ => {
                report.warn(malformed(path, format!("entry '{}': 'data' is not an object", name)));
                Map::new()
            }
        };

        let mut principal = registry.entry(kind, name);

        for pattern in permissions.iter().filter(|p| !p.is_empty()) {
            if let Err(e) = principal.add(pattern) {
                report.warn(e);
            }
        }

        for parent in parents.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            if let Err(e) = principal.add_parent(parent) {
                report.warn(e);
            }
        }

        for (node, value) in data {
            principal.set_data(&node, value);
        }
    }

    tracing::debug!("Loaded {} entries from {:?}", kind.label(), path);
}

/// Strings of a list field; a missing field is empty
fn string_list(
    path: &Path,
    name: &str,
    field: &str,
    value: Value,
    report: &mut LoadReport,
) -> Vec<String> {
    let items = match value {
        Value::Null => return Vec::new(),
        Value::Array(items) => items,
        _ => {
            report.warn(malformed(path, format!("entry '{}': '{}' is not a list", name, field)));
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => out.push(s),
            other => report.warn(malformed(
                path,
                format!("entry '{}': non-string {} element {}", name, field, other),
            )),
        }
    }
    out
}

fn load_simple(registry: &mut Registry, path: &Path, report: &mut LoadReport) {
    let content = match read_or_create(path, "") {
        Ok(content) => content,
        Err(e) => return report.warn(e),
    };

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = registry.player(line).add(WILDCARD_ALL) {
            report.warn(e);
        }
    }
}
