//! Console and Chat Command System
//!
//! Provides unified command handling for console and chat commands, plus
//! the built-in permission administration commands.
//!
//! # Prefixes
//!
//! - Commands with `csr_` prefix (default) auto-register as chat commands
//! - Commands with `css_` prefix also work for CounterStrikeSharp compatibility
//! - Example: `csr_perms_query` can be called as `!perms_query` or `/perms_query` in chat
//!
//! # Example
//!
//! ```ignore
//! use cs2rust_auth::commands::{dispatch_command, register_permission_commands};
//!
//! register_permission_commands();
//!
//! let out = dispatch_command(None, "csr_perms_query STEAM_1:0:1");
//! for line in out.replies {
//!     println!("{}", line);
//! }
//! ```

mod builtin;
mod info;
mod manager;

pub use builtin::{nodes, register_permission_commands};
pub use info::{CommandCallback, CommandContext, CommandInfo, CommandResult};
pub use manager::{
    dispatch_chat, dispatch_command, register_command, register_command_ex,
    register_server_command, unregister_command, CommandKey, CommandManager, CommandOutput,
    COMMANDS, CSS_PREFIX, DEFAULT_PREFIX,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api() {
        // Test that the public API is accessible
        let _context = CommandContext::ServerConsole;
        let _result = CommandResult::Handled;
        assert_eq!(dispatch_command(None, "csr_no_such_command").result, CommandResult::Continue);
    }
}
