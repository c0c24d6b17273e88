//! Built-in permission commands
//!
//! - `csr_perms_reload` - reload the configured backend
//! - `csr_perms_backend [name]` - show or switch the active backend
//! - `csr_perms_query [player|group] <name>` - print transitive permissions
//! - `csr_perms_check [player|group] <name> <node>` - test a single node

use super::info::{CommandInfo, CommandResult};
use super::manager::{register_command_ex, CommandKey};
use crate::backends::LoadReport;
use crate::permissions::{self, PrincipalKind};

/// Permission nodes guarding the built-in commands
pub mod nodes {
    /// Reload permissions or switch backend
    pub const RELOAD: &str = "admin.perms.reload";
    /// Inspect other principals' permissions
    pub const QUERY: &str = "admin.perms.query";
}

/// Register the permission commands, returning their keys
///
/// Commands already registered are skipped.
pub fn register_permission_commands() -> Vec<CommandKey> {
    let registered = [
        register_command_ex(
            "csr_perms_reload",
            "Reload permissions from the configured backend",
            Some(nodes::RELOAD),
            |_, info| reload_command(info),
        ),
        register_command_ex(
            "csr_perms_backend",
            "Show or switch the permission backend",
            Some(nodes::RELOAD),
            |_, info| backend_command(info),
        ),
        register_command_ex(
            "csr_perms_query",
            "List a principal's permissions: [player|group] <name>",
            Some(nodes::QUERY),
            |_, info| query_command(info),
        ),
        register_command_ex(
            "csr_perms_check",
            "Check a permission node: [player|group] <name> <node>",
            Some(nodes::QUERY),
            |_, info| check_command(info),
        ),
    ];

    let keys: Vec<CommandKey> = registered.into_iter().flatten().collect();
    tracing::info!("Registered {} permission commands", keys.len());
    keys
}

/// Parse an optional `player`/`group` selector followed by a name.
///
/// Returns the kind, the name and the index of the next argument.
fn parse_target(info: &CommandInfo) -> Option<(PrincipalKind, &str, usize)> {
    let (kind, index) = match info.arg(1).to_ascii_lowercase().as_str() {
        "player" => (PrincipalKind::Player, 2),
        "group" => (PrincipalKind::Group, 2),
        _ => (PrincipalKind::Player, 1),
    };
    let name = info.arg(index);
    (!name.is_empty()).then_some((kind, name, index + 1))
}

fn reply_report(info: &CommandInfo, report: &LoadReport) {
    let (players, groups) = permissions::principal_count();
    info.reply(&format!(
        "Loaded {} players and {} groups from '{}'",
        players,
        groups,
        permissions::active_backend().unwrap_or_default()
    ));
    for diagnostic in report.diagnostics() {
        info.reply(&format!("Warning: {}", diagnostic));
    }
}

fn reload_command(info: &CommandInfo) -> CommandResult {
    match permissions::reload() {
        Ok(report) => reply_report(info, &report),
        Err(e) => info.reply(&format!("Permission reload failed: {}", e)),
    }
    CommandResult::Handled
}

fn backend_command(info: &CommandInfo) -> CommandResult {
    let name = info.arg(1);
    if name.is_empty() {
        info.reply(&format!(
            "Active backend: {}",
            permissions::active_backend().as_deref().unwrap_or("none")
        ));
        info.reply(&format!(
            "Available: {}",
            permissions::backend_names().join(", ")
        ));
        return CommandResult::Handled;
    }

    match permissions::select_backend(name) {
        Ok(report) => reply_report(info, &report),
        Err(e) => info.reply(&format!("Backend switch failed: {}", e)),
    }
    CommandResult::Handled
}

fn query_command(info: &CommandInfo) -> CommandResult {
    let Some((kind, name, _)) = parse_target(info) else {
        info.reply("Usage: csr_perms_query [player|group] <name>");
        return CommandResult::Handled;
    };

    let found = permissions::with_registry(|r| {
        let principal = match kind {
            PrincipalKind::Player => r.find_player(name),
            PrincipalKind::Group => r.find_group(name),
        }?;
        Some((principal.list_permissions(), principal.parents().join(", ")))
    });

    match found {
        Some((perms, parents)) => {
            info.reply(&format!(
                "{} '{}' has {} permission(s)",
                kind.label(),
                name,
                perms.len()
            ));
            if !parents.is_empty() {
                info.reply(&format!("  inherits: {}", parents));
            }
            for perm in perms {
                info.reply(&format!("  {}", perm));
            }
        }
        None => info.reply(&format!("{} '{}' is not registered", kind.label(), name)),
    }
    CommandResult::Handled
}

fn check_command(info: &CommandInfo) -> CommandResult {
    let target = parse_target(info);
    let Some((kind, name, node)) = target
        .map(|(kind, name, index)| (kind, name, info.arg(index)))
        .filter(|(_, _, node)| !node.is_empty())
    else {
        info.reply("Usage: csr_perms_check [player|group] <name> <node>");
        return CommandResult::Handled;
    };

    let granted = match kind {
        PrincipalKind::Player => permissions::has_permission(name, node),
        PrincipalKind::Group => permissions::group_has_permission(name, node),
    };
    info.reply(&format!(
        "{} '{}' {} '{}'",
        kind.label(),
        name,
        if granted { "has" } else { "does not have" },
        node
    ));
    CommandResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{dispatch_command, CommandContext};

    #[test]
    fn test_parse_target() {
        let info = CommandInfo::parse("csr_perms_query group mods", None, CommandContext::ServerConsole);
        assert_eq!(parse_target(&info), Some((PrincipalKind::Group, "mods", 3)));

        let info = CommandInfo::parse("csr_perms_query STEAM_1:0:1", None, CommandContext::ServerConsole);
        assert_eq!(parse_target(&info), Some((PrincipalKind::Player, "STEAM_1:0:1", 2)));

        let info = CommandInfo::parse("csr_perms_query player", None, CommandContext::ServerConsole);
        assert_eq!(parse_target(&info), None);
    }

    #[test]
    fn test_query_and_check() {
        register_permission_commands();
        permissions::add_permission(PrincipalKind::Group, "builtin_mods", "admin.kick.*").unwrap();
        permissions::add_parent(PrincipalKind::Player, "STEAM_builtin_1", "builtin_mods").unwrap();
        permissions::add_permission(PrincipalKind::Player, "STEAM_builtin_1", "chat.color").unwrap();

        let out = dispatch_command(None, "csr_perms_query STEAM_builtin_1");
        assert_eq!(out.result, CommandResult::Handled);
        assert_eq!(
            out.replies,
            vec![
                "player 'STEAM_builtin_1' has 2 permission(s)",
                "  inherits: builtin_mods",
                "  admin.kick.*",
                "  chat.color",
            ]
        );

        let out = dispatch_command(None, "csr_perms_check STEAM_builtin_1 admin.kick.temp");
        assert_eq!(out.replies, vec!["player 'STEAM_builtin_1' has 'admin.kick.temp'"]);

        let out = dispatch_command(None, "csr_perms_check group builtin_mods admin.ban");
        assert_eq!(out.replies, vec!["group 'builtin_mods' does not have 'admin.ban'"]);

        let out = dispatch_command(None, "csr_perms_query group builtin_missing");
        assert_eq!(out.replies, vec!["group 'builtin_missing' is not registered"]);
    }

    #[test]
    fn test_query_requires_permission() {
        register_permission_commands();

        let out = dispatch_command(Some("STEAM_builtin_nobody"), "csr_perms_query STEAM_builtin_1");
        assert!(out.replies[0].contains(nodes::QUERY));
    }

    #[test]
    fn test_usage_messages() {
        register_permission_commands();

        let out = dispatch_command(None, "csr_perms_check STEAM_builtin_2");
        assert!(out.replies[0].starts_with("Usage:"));
        let out = dispatch_command(None, "csr_perms_query");
        assert!(out.replies[0].starts_with("Usage:"));
    }
}
