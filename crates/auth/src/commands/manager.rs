//! Command manager - registration and dispatch

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use super::info::{CommandCallback, CommandContext, CommandInfo, CommandResult};

new_key_type! {
    /// Handle for a registered command
    pub struct CommandKey;
}

/// Default command prefix for CS2Rust
pub const DEFAULT_PREFIX: &str = "csr_";

/// CounterStrikeSharp compatibility prefix
pub const CSS_PREFIX: &str = "css_";

/// Registered command information
struct CommandEntry {
    /// Full command name (e.g., "csr_perms_reload")
    name: String,
    /// Short name without prefix (e.g., "perms_reload")
    short_name: String,
    /// Command description
    description: String,
    /// Callback function
    callback: CommandCallback,
    /// Whether this is server-only
    server_only: bool,
    /// Required permission node (e.g., "admin.perms.reload")
    required_permission: Option<String>,
}

/// Global command manager
pub struct CommandManager {
    /// Commands indexed by key
    commands: SlotMap<CommandKey, CommandEntry>,

    /// Lookup by full command name (case-insensitive, lowercase)
    by_name: HashMap<String, CommandKey>,

    /// Lookup by short name for chat commands (case-insensitive, lowercase)
    by_short_name: HashMap<String, CommandKey>,
}

/// Outcome of dispatching a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub result: CommandResult,
    pub replies: Vec<String>,
}

impl CommandManager {
    fn new() -> Self {
        Self {
            commands: SlotMap::with_key(),
            by_name: HashMap::new(),
            by_short_name: HashMap::new(),
        }
    }

    /// Register a command
    fn register(
        &mut self,
        name: &str,
        description: &str,
        server_only: bool,
        required_permission: Option<String>,
        callback: CommandCallback,
    ) -> Option<CommandKey> {
        let name_lower = name.to_lowercase();

        if self.by_name.contains_key(&name_lower) {
            tracing::warn!("Command '{}' already registered", name);
            return None;
        }

        let short_name = name_lower
            .strip_prefix(DEFAULT_PREFIX)
            .or_else(|| name_lower.strip_prefix(CSS_PREFIX))
            .unwrap_or(name_lower.as_str())
            .to_string();

        let entry = CommandEntry {
            name: name.to_string(),
            short_name: short_name.clone(),
            description: description.to_string(),
            callback,
            server_only,
            required_permission,
        };

        let key = self.commands.insert(entry);

        // Only register short name if it's different from the full name
        if short_name != name_lower {
            self.by_short_name.insert(short_name, key);
        }
        self.by_name.insert(name_lower, key);

        tracing::debug!("Registered command: {}", name);
        Some(key)
    }

    /// Unregister a command by key
    fn unregister(&mut self, key: CommandKey) -> bool {
        if let Some(entry) = self.commands.remove(key) {
            self.by_name.remove(&entry.name.to_lowercase());
            self.by_short_name.remove(&entry.short_name);
            tracing::debug!("Unregistered command: {}", entry.name);
            true
        } else {
            false
        }
    }

    /// Find command by full name
    pub fn find_by_name(&self, name: &str) -> Option<CommandKey> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    /// Find command by short name (for chat commands)
    pub fn find_by_short_name(&self, name: &str) -> Option<CommandKey> {
        self.by_short_name.get(&name.to_lowercase()).copied()
    }

    /// Execute a command by key
    fn execute(&self, key: CommandKey, info: &CommandInfo) -> CommandResult {
        let Some(entry) = self.commands.get(key) else {
            return CommandResult::Continue;
        };
        let caller = info.caller();

        if entry.server_only && caller.is_some() {
            info.reply("This command can only be executed from the server console.");
            return CommandResult::Handled;
        }

        // Server console always has permission
        if let (Some(permission), Some(id)) = (entry.required_permission.as_deref(), caller) {
            if !crate::permissions::has_permission(id, permission) {
                tracing::debug!("{} denied '{}' (requires {})", id, entry.name, permission);
                info.reply(&format!(
                    "You don't have permission to use this command. Required: {}",
                    permission
                ));
                return CommandResult::Handled;
            }
        }

        (entry.callback)(caller, info)
    }

    /// Get command name
    pub fn get_name(&self, key: CommandKey) -> Option<&str> {
        self.commands.get(key).map(|e| e.name.as_str())
    }

    /// Iterate over all registered commands
    pub fn iter(&self) -> impl Iterator<Item = (CommandKey, &str, &str)> {
        self.commands
            .iter()
            .map(|(key, entry)| (key, entry.name.as_str(), entry.description.as_str()))
    }

    /// Get total number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if command manager has no registered commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Global command manager instance
pub static COMMANDS: LazyLock<RwLock<CommandManager>> =
    LazyLock::new(|| RwLock::new(CommandManager::new()));

/// Register a command with the default prefix (csr_)
///
/// # Example
/// ```ignore
/// use cs2rust_auth::commands::{register_command, CommandResult};
///
/// let key = register_command("csr_ping", "Respond with pong", |_caller, info| {
///     info.reply("Pong!");
///     CommandResult::Handled
/// });
/// ```
pub fn register_command<F>(name: &str, description: &str, callback: F) -> Option<CommandKey>
where
    F: Fn(Option<&str>, &CommandInfo) -> CommandResult + Send + Sync + 'static,
{
    COMMANDS
        .write()
        .register(name, description, false, None, Box::new(callback))
}

/// Register a command that requires a permission node
///
/// Players without `permission` are refused before the callback runs.
/// The server console is never refused.
pub fn register_command_ex<F>(
    name: &str,
    description: &str,
    permission: Option<&str>,
    callback: F,
) -> Option<CommandKey>
where
    F: Fn(Option<&str>, &CommandInfo) -> CommandResult + Send + Sync + 'static,
{
    COMMANDS.write().register(
        name,
        description,
        false,
        permission.map(str::to_string),
        Box::new(callback),
    )
}

/// Register a server-only command (console)
pub fn register_server_command<F>(
    name: &str,
    description: &str,
    callback: F,
) -> Option<CommandKey>
where
    F: Fn(Option<&str>, &CommandInfo) -> CommandResult + Send + Sync + 'static,
{
    COMMANDS
        .write()
        .register(name, description, true, None, Box::new(callback))
}

/// Unregister a command
pub fn unregister_command(key: CommandKey) -> bool {
    COMMANDS.write().unregister(key)
}

/// Dispatch a console command line
///
/// `caller` is the unique id of the calling player, or `None` for the
/// server console. Unknown commands return [`CommandResult::Continue`]
/// with no replies.
pub fn dispatch_command(caller: Option<&str>, line: &str) -> CommandOutput {
    let context = if caller.is_some() {
        CommandContext::ClientConsole
    } else {
        CommandContext::ServerConsole
    };
    let info = CommandInfo::parse(line, caller, context);

    let result = {
        let commands = COMMANDS.read();
        match commands.find_by_name(info.command_name()) {
            Some(key) => commands.execute(key, &info),
            None => CommandResult::Continue,
        }
    };

    CommandOutput {
        result,
        replies: info.take_replies(),
    }
}

/// Dispatch a chat message
///
/// `!name args` runs the command publicly, `/name args` silently. Messages
/// without a trigger, or naming no command, return [`CommandResult::Continue`].
pub fn dispatch_chat(caller: &str, message: &str) -> CommandOutput {
    let (context, rest) = if let Some(rest) = message.strip_prefix('!') {
        (CommandContext::ChatPublic, rest)
    } else if let Some(rest) = message.strip_prefix('/') {
        (CommandContext::ChatSilent, rest)
    } else {
        return CommandOutput {
            result: CommandResult::Continue,
            replies: Vec::new(),
        };
    };
    let info = CommandInfo::parse(rest, Some(caller), context);

    let result = {
        let commands = COMMANDS.read();
        match commands.find_by_short_name(info.command_name()) {
            Some(key) => {
                let result = commands.execute(key, &info);
                // Silent triggers never echo to chat
                if context.is_silent() && result == CommandResult::Handled {
                    CommandResult::Block
                } else {
                    result
                }
            }
            None => CommandResult::Continue,
        }
    };

    CommandOutput {
        result,
        replies: info.take_replies(),
    }
}
