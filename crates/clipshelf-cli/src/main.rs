//! Clipshelf CLI - clipboard history with pinning and paste-back
//!
//! Clipshelf watches the clipboard, keeps the last few things you copied, and
//! pastes any of them back into the application you were using.
//!
//! ## Quick Start
//!
//! ```bash
//! # Watch the clipboard and pick entries from the terminal
//! clipshelf run
//!
//! # Show entries pinned in earlier sessions
//! clipshelf pinned
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

use anyhow::Result;
use clap::Parser;

mod commands;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Command::Run(args) => commands::run::run(args).await,
        Command::Pinned(args) => commands::pinned::run(args).await,
        Command::Config(args) => commands::config::run(args).await,
        Command::Diagnose(args) => commands::diagnose::run(args).await,
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = match verbose {
        0 => "warn,clipshelf=info,clipshelf_core=info",
        1 => "warn,clipshelf=debug,clipshelf_core=debug",
        _ => "info,clipshelf=trace,clipshelf_core=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
