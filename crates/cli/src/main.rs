//! cs2rust-auth - Permission tool
//!
//! Loads the permission backend the same way the server does, then runs one
//! permission command against it and prints the replies.
//!
//! ```text
//! cs2rust-auth --config-dir ./configs csr_perms_query group mods
//! cs2rust-auth --as STEAM_1:0:1 csr_perms_check STEAM_1:0:1 admin.ban
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: tracing filter (defaults to `warn`, or `debug` with `--debug`)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cs2rust_auth::commands::COMMANDS;
use cs2rust_auth::config::configs_dir;
use cs2rust_auth::{dispatch_command, register_permission_commands, CommandResult};
use tracing_subscriber::EnvFilter;

/// Reload and inspect CS2Rust permissions
#[derive(Parser, Debug)]
#[command(name = "cs2rust-auth")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config directory holding `auth/` (defaults to the addon's configs dir)
    #[arg(short = 'C', long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Run the command as this player instead of the server console
    #[arg(long = "as", value_name = "UNIQUE_ID")]
    caller: Option<String>,

    /// Command to execute; lists commands when omitted
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.debug);

    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => match configs_dir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!("Cannot locate config directory: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    // Load problems are already logged; keep going on failure so
    // `csr_perms_backend` can repair the selection
    match cs2rust_auth::init(&config_dir) {
        Ok(report) => tracing::debug!(
            "Loaded permissions from {:?} with {} warnings",
            config_dir,
            report.diagnostics().len()
        ),
        Err(e) => tracing::error!("Permission init failed: {}", e),
    }

    register_permission_commands();

    if args.command.is_empty() {
        println!("Available commands:");
        for (_, name, description) in COMMANDS.read().iter() {
            println!("  {:<20} {}", name, description);
        }
        return ExitCode::SUCCESS;
    }

    let line = args.command.join(" ");
    let output = dispatch_command(args.caller.as_deref(), &line);
    for reply in &output.replies {
        println!("{}", reply);
    }

    cs2rust_auth::shutdown();

    if output.result == CommandResult::Continue && output.replies.is_empty() {
        tracing::error!("Unknown command: {}", args.command[0]);
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
