//! Command information types

use std::cell::RefCell;

/// Context from which a command was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandContext {
    /// Called from server console (no player)
    ServerConsole,
    /// Called from client console
    ClientConsole,
    /// Called from public chat (!cmd)
    ChatPublic,
    /// Called from silent chat (/cmd)
    ChatSilent,
}

impl CommandContext {
    /// Returns true if command was triggered from chat
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::ChatPublic | Self::ChatSilent)
    }

    /// Returns true if command was triggered from console
    pub fn is_console(&self) -> bool {
        matches!(self, Self::ServerConsole | Self::ClientConsole)
    }

    /// Returns true if this is a silent chat command (should not show in chat)
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::ChatSilent)
    }
}

/// Result of command execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum CommandResult {
    /// Continue processing, allow other handlers
    #[default]
    Continue = 0,
    /// Command was handled, stop processing
    Handled = 1,
    /// Block the command entirely (prevent original behavior)
    Block = 2,
}

/// Information about a command invocation
pub struct CommandInfo {
    /// Raw command arguments (index 0 is the command name)
    args: Vec<String>,

    /// Unique id of the calling player (None if server console)
    caller: Option<String>,

    /// Context of command invocation
    context: CommandContext,

    /// Replies produced by the handler, in order
    replies: RefCell<Vec<String>>,
}

impl CommandInfo {
    /// Create new CommandInfo
    pub fn new(
        args: Vec<String>,
        caller: Option<String>,
        context: CommandContext,
    ) -> Self {
        Self {
            args,
            caller,
            context,
            replies: RefCell::new(Vec::new()),
        }
    }

    /// Split a command line on whitespace
    pub fn parse(line: &str, caller: Option<&str>, context: CommandContext) -> Self {
        Self::new(
            line.split_whitespace().map(str::to_string).collect(),
            caller.map(str::to_string),
            context,
        )
    }

    /// Get the number of arguments (including command name at index 0)
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Get argument by index (0 = command name)
    ///
    /// Returns empty string if index is out of bounds.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    /// Get the command name (alias for arg(0))
    pub fn command_name(&self) -> &str {
        self.arg(0)
    }

    /// Get all arguments after command name as a single string
    pub fn arg_string(&self) -> String {
        if self.args.len() > 1 {
            self.args[1..].join(" ")
        } else {
            String::new()
        }
    }

    /// Unique id of the player who executed the command (None for server console)
    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    /// Reply to the command
    ///
    /// Replies are logged and collected; the host delivers them to the caller.
    pub fn reply(&self, message: &str) {
        match (self.context, self.caller.as_deref()) {
            (CommandContext::ServerConsole, _) | (_, None) => {
                tracing::info!("[Server] {}", message);
            }
            (_, Some(caller)) => {
                tracing::info!("[Reply -> {}] {}", caller, message);
            }
        }
        self.replies.borrow_mut().push(message.to_string());
    }

    /// Reply with formatted message
    pub fn reply_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.reply(&args.to_string());
    }

    /// Take the collected replies
    pub fn take_replies(&self) -> Vec<String> {
        std::mem::take(&mut *self.replies.borrow_mut())
    }
}

/// Type alias for command callback functions
pub type CommandCallback = Box<dyn Fn(Option<&str>, &CommandInfo) -> CommandResult + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_context() {
        assert!(CommandContext::ChatPublic.is_chat());
        assert!(CommandContext::ChatSilent.is_chat());
        assert!(!CommandContext::ServerConsole.is_chat());

        assert!(CommandContext::ServerConsole.is_console());
        assert!(CommandContext::ClientConsole.is_console());
        assert!(!CommandContext::ChatPublic.is_console());

        assert!(CommandContext::ChatSilent.is_silent());
        assert!(!CommandContext::ChatPublic.is_silent());
    }

    #[test]
    fn test_command_info() {
        let info = CommandInfo::parse(
            "csr_perms_check  player STEAM_1:0:1 admin.ban",
            None,
            CommandContext::ServerConsole,
        );

        assert_eq!(info.arg_count(), 4);
        assert_eq!(info.command_name(), "csr_perms_check");
        assert_eq!(info.arg(1), "player");
        assert_eq!(info.arg(3), "admin.ban");
        assert_eq!(info.arg(999), "");
        assert_eq!(info.arg_string(), "player STEAM_1:0:1 admin.ban");
        assert!(info.caller().is_none());
    }

    #[test]
    fn test_replies_are_collected() {
        let info = CommandInfo::parse("csr_test", Some("STEAM_1:0:1"), CommandContext::ChatSilent);
        info.reply("one");
        info.reply_fmt(format_args!("{} {}", "two", 2));

        assert_eq!(info.take_replies(), vec!["one", "two 2"]);
        assert!(info.take_replies().is_empty());
    }
}
