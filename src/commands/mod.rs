//! Subcommand implementations

mod check;
mod deploy;
mod plan;

pub use check::cmd_check;
pub use deploy::cmd_deploy;
pub use plan::cmd_plan;

use std::path::Path;

use anyhow::Result;

use dockhand::config::{self, ConfigWarning};
use dockhand::domain::ports::DeployEventSink;
use dockhand::infrastructure::{ConsoleEventSink, JsonEventSink};
use dockhand::DeployConfig;

use crate::ui::context::UiContext;

/// Load the config file and report unknown keys
fn load_config(path: &Path, ui: &UiContext) -> Result<DeployConfig> {
    let (config, warnings) = config::load(path)?;
    print_config_warnings(&warnings, path, ui);
    Ok(config)
}

fn print_config_warnings(warnings: &[ConfigWarning], path: &Path, ui: &UiContext) {
    for warning in warnings {
        if ui.json {
            let output = serde_json::json!({
                "event": "config_warning",
                "config": path.display().to_string(),
                "key": warning.key,
                "line": warning.line,
                "suggestion": warning.suggestion,
            });
            println!("{}", output);
        } else {
            eprintln!("warning: {}: {}", path.display(), warning);
        }
    }
}

/// Progress sink for a run: NDJSON on stdout or console lines on stderr
fn event_sink(ui: &UiContext) -> Box<dyn DeployEventSink> {
    if ui.json {
        Box::new(JsonEventSink::stdout())
    } else {
        Box::new(ConsoleEventSink::stderr(ui.color, ui.unicode, ui.verbose > 0))
    }
}
