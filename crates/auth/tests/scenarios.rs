//! End-to-end permission scenarios against the flat-file backend

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use cs2rust_auth::backends::{ADMINS_FILE, GROUPS_FILE, SIMPLE_FILE};
use cs2rust_auth::config::{auth_dir, permissions_config_path};
use cs2rust_auth::{PermissionManager, Registry};
use serde_json::Value;
use tempfile::TempDir;

fn write_auth(dir: &Path, file: &str, content: &str) {
    let auth = auth_dir(dir);
    std::fs::create_dir_all(&auth).unwrap();
    std::fs::write(auth.join(file), content).unwrap();
}

fn loaded(admins: &str, groups: &str, simple: &str) -> (TempDir, PermissionManager) {
    let dir = TempDir::new().unwrap();
    write_auth(dir.path(), ADMINS_FILE, admins);
    write_auth(dir.path(), GROUPS_FILE, groups);
    write_auth(dir.path(), SIMPLE_FILE, simple);

    let mut manager = PermissionManager::new();
    manager.init(dir.path()).unwrap();
    (dir, manager)
}

#[test]
fn wildcard_at_top_level() {
    let mut registry = Registry::new();
    registry.player("STEAM_1:0:1").add("*").unwrap();

    let player = registry.find_player("STEAM_1:0:1").unwrap();
    assert!(player.contains("admin.ban"));
    assert!(player.contains("anything.at.all"));
}

#[test]
fn dotted_prefix_wildcard() {
    let mut registry = Registry::new();
    registry.group("mods").add("admin.kick.*").unwrap();
    registry.player("P").add_parent("mods").unwrap();

    let player = registry.find_player("P").unwrap();
    assert!(player.contains("admin.kick.temp"));
    assert!(!player.contains("admin.ban"));
}

#[test]
fn parent_chain() {
    let mut registry = Registry::new();
    registry.group("a").add_parent("b").unwrap();
    registry.group("b").add_parent("c").unwrap();
    registry.group("c").add("srv.reload").unwrap();

    assert!(registry.find_group("a").unwrap().contains("srv.reload"));
    assert!(registry.find_group("c").unwrap().children().contains(&"b"));
    assert!(registry.find_group("b").unwrap().children().contains(&"a"));
}

#[test]
fn cycle_terminates() {
    let mut registry = Registry::new();
    registry.group("a").add_parent("b").unwrap();
    registry.group("b").add_parent("a").unwrap();

    let a = registry.find_group("a").unwrap();
    assert!(!a.contains("x"));
    assert!(a.list_permissions().is_empty());
}

#[test]
fn malformed_file_is_survivable() {
    let (dir, _) = loaded("{}", "{}", "");
    write_auth(dir.path(), ADMINS_FILE, "{ not-json");
    write_auth(
        dir.path(),
        GROUPS_FILE,
        r#"{ "mods": { "permissions": ["admin.kick.*"] } }"#,
    );
    write_auth(dir.path(), SIMPLE_FILE, "STEAM_1:0:2\n");

    let mut manager = PermissionManager::new();
    let report = manager.init(dir.path()).unwrap();

    assert!(report.mentions(&auth_dir(dir.path()).join(ADMINS_FILE)));
    assert!(report
        .diagnostics()
        .iter()
        .any(|d| d.to_string().contains("admins.json")));

    let registry = manager.registry();
    assert!(registry.find_group("mods").unwrap().contains("admin.kick.temp"));
    assert!(registry.find_player("STEAM_1:0:2").unwrap().contains("x.y"));
}

#[test]
fn simple_txt_grants_all() {
    let (_dir, manager) = loaded("{}", "{}", "STEAM_1:0:2\n");

    let player = manager.registry().find_player("STEAM_1:0:2").unwrap();
    assert!(player.contains("any.node.at.all"));
}

#[test]
fn transitive_parent_grants_propagate() {
    let (_dir, manager) = loaded(
        r#"{ "P": { "parents": ["staff"] } }"#,
        r#"{
            "staff": { "parents": ["mods", "vip"] },
            "mods": { "permissions": ["admin.kick.*"], "parents": ["base"] },
            "vip": { "permissions": ["chat.color"] },
            "base": { "permissions": ["chat.*"] }
        }"#,
        "",
    );
    let registry = manager.registry();
    let player = registry.find_player("P").unwrap();

    for group in ["staff", "mods", "vip", "base"] {
        let group = registry.find_group(group).unwrap();
        for node in ["admin.kick.temp", "chat.color", "chat.all", "srv.reload"] {
            if group.contains(node) {
                assert!(player.contains(node), "{} via {}", node, group.name());
            }
        }
    }
    assert!(!player.contains("srv.reload"));
}

/// Closure of `permissions` over `parents`, computed straight from the JSON
fn closure(
    name: &str,
    own: &BTreeMap<String, Value>,
    groups: &BTreeMap<String, Value>,
    seen: &mut BTreeSet<String>,
    out: &mut BTreeSet<String>,
) {
    let Some(entry) = own.get(name) else {
        return;
    };
    if let Some(perms) = entry["permissions"].as_array() {
        out.extend(perms.iter().filter_map(Value::as_str).map(str::to_string));
    }
    if let Some(parents) = entry["parents"].as_array() {
        for parent in parents.iter().filter_map(Value::as_str) {
            if seen.insert(parent.to_string()) {
                closure(parent, groups, groups, seen, out);
            }
        }
    }
}

#[test]
fn flatfile_round_trip_matches_json_closure() {
    let admins = r#"{
        "STEAM_1:0:1": { "permissions": ["vip"], "parents": ["mods"] },
        "STEAM_1:0:2": { "parents": ["loop_a"] }
    }"#;
    let groups = r#"{
        "mods": { "permissions": ["admin.kick.*"], "parents": ["base"] },
        "base": { "permissions": ["chat.*", "vote.*"] },
        "loop_a": { "permissions": ["a"], "parents": ["loop_b"] },
        "loop_b": { "permissions": ["b"], "parents": ["loop_a"] }
    }"#;
    let (_dir, manager) = loaded(admins, groups, "");
    let registry = manager.registry();

    let admins: BTreeMap<String, Value> = serde_json::from_str(admins).unwrap();
    let groups: BTreeMap<String, Value> = serde_json::from_str(groups).unwrap();

    for name in admins.keys() {
        let mut expected = BTreeSet::new();
        closure(name, &admins, &groups, &mut BTreeSet::new(), &mut expected);
        assert_eq!(registry.find_player(name).unwrap().list_permissions(), expected);
    }
    for name in groups.keys() {
        let mut expected = BTreeSet::new();
        let mut seen = BTreeSet::from([name.clone()]);
        closure(name, &groups, &groups, &mut seen, &mut expected);
        assert_eq!(registry.find_group(name).unwrap().list_permissions(), expected);
    }
}

#[test]
fn config_is_stable_across_loads() {
    let dir = TempDir::new().unwrap();
    let path = permissions_config_path(dir.path());

    let mut manager = PermissionManager::new();
    manager.init(dir.path()).unwrap();
    let first = std::fs::read(&path).unwrap();

    manager.reload().unwrap();
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
    let text = String::from_utf8(second).unwrap();
    assert!(text.contains("PermissionBackend = \"flatfile\""));
    assert!(text.contains("admin_config_path"));
}

#[test]
fn custom_file_paths_are_honoured() {
    let dir = TempDir::new().unwrap();
    let custom = dir.path().join("elsewhere").join("staff.json");
    std::fs::create_dir_all(custom.parent().unwrap()).unwrap();
    std::fs::write(&custom, r#"{ "P": { "permissions": ["srv.*"] } }"#).unwrap();

    let config = permissions_config_path(dir.path());
    std::fs::create_dir_all(config.parent().unwrap()).unwrap();
    std::fs::write(
        &config,
        format!(
            "[backends.flatfile]\nadmin_config_path = {:?}\n",
            custom.to_string_lossy()
        ),
    )
    .unwrap();

    let mut manager = PermissionManager::new();
    manager.init(dir.path()).unwrap();

    assert!(manager.registry().find_player("P").unwrap().contains("srv.reload"));
    assert!(auth_dir(dir.path()).join(GROUPS_FILE).exists());
    assert!(!auth_dir(dir.path()).join(ADMINS_FILE).exists());
}
