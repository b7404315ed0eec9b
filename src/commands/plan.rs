use std::path::Path;

use anyhow::Result;

use dockhand::domain::ports::NoopEventSink;
use dockhand::presentation::{create_renderer, factory, OutputFormat, SessionMode};
use dockhand::DeployOptions;

use crate::ui::context::UiContext;

/// Dry run that prints the numbered command sequence instead of progress
pub fn cmd_plan(
    config_path: &Path,
    no_cache: bool,
    skip_migrations: bool,
    ui: &UiContext,
) -> Result<()> {
    let config = super::load_config(config_path, ui)?;
    let options = DeployOptions::new()
        .with_no_cache(no_cache)
        .with_skip_migrations(skip_migrations)
        .with_dry_run(true);

    let report = factory::execute(SessionMode::DryRun, &config, &options, &NoopEventSink)?;

    let renderer = create_renderer(
        OutputFormat::from_json_flag(ui.json),
        ui.color,
        ui.unicode,
        ui.verbose,
    );
    print!("{}", renderer.render_plan(&report));
    Ok(())
}
