use std::path::Path;

use anyhow::Result;

use dockhand::application::preconditions;
use dockhand::presentation::{create_renderer, OutputFormat};

use crate::ui::context::UiContext;

/// Load the config and run every local check; never opens a session
pub fn cmd_check(config_path: &Path, ui: &UiContext) -> Result<()> {
    let config = super::load_config(config_path, ui)?;
    let result = preconditions::inspect(&config);

    let renderer = create_renderer(
        OutputFormat::from_json_flag(ui.json),
        ui.color,
        ui.unicode,
        ui.verbose,
    );
    print!("{}", renderer.render_check(&result, config_path));

    match result.into_error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
