//! snapwatch — observe snapd package revisions and verify forced updates.
//!
//! # Usage
//!
//! ```text
//! snapwatch list [--json]
//! snapwatch info [<package>] [--json]
//! snapwatch installed [<package>]
//! snapwatch watch [--package <name>] [--trigger-url <url>] [--interval <secs>]
//!                 [--timeout <secs>] [--max-polls <n>] [--iterations <n>] [--json]
//!
//! global: --config <path>  --socket <path>  --log-json
//! ```

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use commands::{info::InfoArgs, installed::InstalledArgs, list::ListArgs, watch::WatchArgs};
use snapwatch_core::{config, WatchConfig};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "snapwatch",
    version,
    about = "Verify that a snap-packaged agent receives and activates updates",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every installed package reported by snapd.
    List(ListArgs),

    /// Show one package's revision and service state.
    Info(InfoArgs),

    /// Exit successfully only if the package is installed.
    Installed(InstalledArgs),

    /// Fire the agent's update trigger and wait for the revision to advance.
    Watch(WatchArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file (default: ~/.config/snapwatch/config.yaml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// snapd control socket, overriding the config file.
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    /// Effective config: file (or defaults), then global overrides.
    pub fn load_config(&self) -> Result<WatchConfig> {
        let mut config = config::load_or_default(self.config.as_deref())
            .context("failed to load snapwatch config")?;
        if let Some(socket) = &self.socket {
            config.socket_path = socket.clone();
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.global.log_json);

    match cli.command {
        Commands::List(args) => args.run(&cli.global),
        Commands::Info(args) => args.run(&cli.global),
        Commands::Installed(args) => args.run(&cli.global),
        Commands::Watch(args) => args.run(&cli.global),
    }
}
