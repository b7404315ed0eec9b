//! Dockhand CLI - remote container deployment orchestrator
//!
//! Usage: dockhand <COMMAND>
//!
//! Commands:
//!   deploy  Run the full pipeline against the configured host
//!   check   Validate the config and local files without connecting
//!   plan    Print the command sequence a deploy would issue

mod cli;
mod commands;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use ui::context::UiContext;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error::print_error(&err, json);
            ExitCode::from(ui::error::exit_code(&err).clamp(1, 255) as u8)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ui = UiContext::new(cli.json, cli.verbose, cli.color);

    match cli.command {
        Commands::Deploy(args) => commands::cmd_deploy(&args, &ui),
        Commands::Check(target) => commands::cmd_check(&target.config, &ui),
        Commands::Plan {
            target,
            no_cache,
            skip_migrations,
        } => commands::cmd_plan(&target.config, no_cache, skip_migrations, &ui),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the `-v` count
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dockhand={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
