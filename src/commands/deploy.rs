use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::Confirm;

use dockhand::application::preconditions;
use dockhand::presentation::{create_renderer, factory, OutputFormat, SessionMode};
use dockhand::{DeployConfig, DeployOptions};

use crate::cli::DeployArgs;
use crate::ui::context::UiContext;
use crate::ui::terminal::stdin_is_interactive;

pub fn cmd_deploy(args: &DeployArgs, ui: &UiContext) -> Result<()> {
    let config = super::load_config(&args.target.config, ui)?;

    // Fail on missing local files before asking anything
    preconditions::validate(&config)?;

    let mode = SessionMode::from_flags(args.local, args.dry_run);
    if should_confirm(args, ui.json, stdin_is_interactive()) && !confirm(&config, mode)? {
        eprintln!("Aborted.");
        return Ok(());
    }

    let options = DeployOptions::new()
        .with_no_cache(args.no_cache)
        .with_skip_migrations(args.skip_migrations)
        .with_dry_run(args.dry_run)
        .with_interrupt(install_interrupt_handler()?);

    let events = super::event_sink(ui);
    let report = factory::execute(mode, &config, &options, events.as_ref())?;

    let renderer = create_renderer(
        OutputFormat::from_json_flag(ui.json),
        ui.color,
        ui.unicode,
        ui.verbose,
    );
    print!("{}", renderer.render_report(&report));
    Ok(())
}

/// Prompt only when someone can answer and the run touches the host
fn should_confirm(args: &DeployArgs, json: bool, interactive: bool) -> bool {
    interactive && !args.yes && !json && !args.dry_run
}

fn confirm(config: &DeployConfig, mode: SessionMode) -> Result<bool> {
    let target = match mode {
        SessionMode::Local => format!("this machine ({})", config.remote_dir),
        _ => format!("{}:{}", config.destination(), config.remote_dir),
    };
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Deploy '{}' ({}) to {}?",
            config.service,
            config.source.describe(),
            target
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Ctrl+C sets the flag; the run stops before its next remote command
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();

    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    Ok(interrupted)
}
