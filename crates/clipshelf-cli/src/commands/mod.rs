//! CLI command definitions and handlers.

use clap::{ArgAction, Parser, Subcommand};

/// Load configuration with graceful fallback to defaults.
///
/// A missing, unreadable or invalid config file is reported once and the
/// defaults are used instead.
pub fn load_config() -> clipshelf_core::config::Config {
    clipshelf_core::config::Config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default configuration: {}", e);
        clipshelf_core::config::Config::default()
    })
}

pub mod config;
pub mod diagnose;
pub mod pinned;
pub mod run;

/// Clipshelf - clipboard history with pinning and paste-back
#[derive(Parser)]
#[command(name = "clipshelf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Watch the clipboard and pick entries from the terminal
    Run(RunArgs),

    /// Show persisted pinned entries
    Pinned(PinnedArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Check clipboard and automation access
    Diagnose(DiagnoseArgs),
}

/// Arguments for the run command
#[derive(Parser)]
pub struct RunArgs {
    /// Also send a paste keystroke to the window focused when an entry is
    /// picked (for pickers driven through stdin from another tool)
    #[arg(long)]
    pub paste: bool,
}

/// Arguments for the pinned command
#[derive(Parser)]
pub struct PinnedArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show all configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Reset to defaults
    Reset,
}

/// Arguments for the diagnose command
#[derive(Parser)]
pub struct DiagnoseArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from(["clipshelf", "-vv", "run", "--paste"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Run(RunArgs { paste: true })));

        let cli = Cli::try_parse_from(["clipshelf", "run"]).unwrap();
        assert!(matches!(cli.command, Command::Run(RunArgs { paste: false })));
    }

    #[test]
    fn test_cli_parses_config_action() {
        let cli = Cli::try_parse_from(["clipshelf", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigArgs {
                action: ConfigAction::Path
            })
        ));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
