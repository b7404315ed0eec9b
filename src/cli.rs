//! CLI Argument Parsing
//!
//! Global flags (--json, --color, --verbose) are inherited by all
//! subcommands. Every subcommand reads the same `key=value` config file;
//! flags only toggle per-run behaviour.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// Dockhand - deploy one compose service to a remote host over SSH
#[derive(Parser, Debug)]
#[command(name = "dockhand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit NDJSON events instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorWhen>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Path to the deploy config file
    #[arg(short, long, default_value = "deploy.conf")]
    pub config: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: ConfigArg,

    /// Rebuild the image without the layer cache
    #[arg(long)]
    pub no_cache: bool,

    /// Do not run migrations
    #[arg(long)]
    pub skip_migrations: bool,

    /// Print what would run without touching the host
    #[arg(long)]
    pub dry_run: bool,

    /// Run every command on this machine instead of over SSH
    #[arg(long)]
    pub local: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: source, build, migrate, cutover, cleanup
    Deploy(DeployArgs),

    /// Load the config and verify local files (no network)
    Check(ConfigArg),

    /// Show the command sequence a deploy would issue
    Plan {
        #[command(flatten)]
        target: ConfigArg,

        /// Plan a build without the layer cache
        #[arg(long)]
        no_cache: bool,

        /// Plan without migrations
        #[arg(long)]
        skip_migrations: bool,
    },
}
