//! Output Rendering
//!
//! Renders the final deploy report, the dry-run plan and the precondition
//! check results. Progress while a run is underway goes through the event
//! sinks instead.

use std::path::Path;

use crossterm::style::{Color, Stylize};

use crate::application::{CheckResult, CheckStatus, DeployReport};

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// One JSON object per line, for scripting
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Icons for output rendering
struct Icons {
    check: &'static str,
    cross: &'static str,
    warn: &'static str,
    skip: &'static str,
    arrow: &'static str,
}

impl Icons {
    fn unicode() -> Self {
        Self {
            check: "✓",
            cross: "✗",
            warn: "⚠",
            skip: "○",
            arrow: "→",
        }
    }

    fn ascii() -> Self {
        Self {
            check: "[OK]",
            cross: "[FAIL]",
            warn: "[WARN]",
            skip: "[--]",
            arrow: "->",
        }
    }
}

/// Renders results to a string, ready to print
pub trait ReportRenderer {
    /// Summary of a finished deploy
    fn render_report(&self, report: &DeployReport) -> String;

    /// Command sequence recorded by a dry run
    fn render_plan(&self, report: &DeployReport) -> String;

    /// Local precondition results for `config_path`
    fn render_check(&self, result: &CheckResult, config_path: &Path) -> String;
}

/// Text renderer
pub struct TextRenderer {
    /// Whether to use colors
    pub color: bool,
    /// Whether to use unicode
    pub unicode: bool,
    /// Verbosity level
    pub verbose: u8,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            color: true,
            unicode: true,
            verbose: 0,
        }
    }
}

impl TextRenderer {
    fn icons(&self) -> Icons {
        if self.unicode {
            Icons::unicode()
        } else {
            Icons::ascii()
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn target(report: &DeployReport) -> String {
        format!("{}:{}", report.destination, report.remote_dir)
    }
}

impl ReportRenderer for TextRenderer {
    fn render_report(&self, report: &DeployReport) -> String {
        let icons = self.icons();
        let mut out = String::new();

        let (icon, color) = if report.is_clean() {
            (icons.check, Color::Green)
        } else {
            (icons.warn, Color::Yellow)
        };
        let title = if report.dry_run {
            "Dry Run Complete"
        } else {
            "Deploy Complete"
        };
        out.push_str(&format!("{} {}\n\n", self.paint(icon, color), title));
        out.push_str(&format!("  Target:  {}\n", Self::target(report)));
        out.push_str(&format!("  Service: {}\n", report.service));

        let stages: Vec<&str> = report.completed.iter().map(|s| s.name()).collect();
        let separator = format!(" {} ", icons.arrow);
        out.push_str(&format!("  Stages:  {}\n", stages.join(separator.as_str())));

        for skipped in &report.skipped {
            out.push_str(&format!(
                "    {} {} skipped: {}\n",
                self.paint(icons.skip, Color::DarkGrey),
                skipped.stage,
                skipped.reason
            ));
        }

        if !report.migrations.is_empty() {
            out.push_str(&format!("\n  Migrations ({}):\n", report.migrations.len()));
            for set in &report.migrations {
                out.push_str(&format!("    {} {}\n", icons.arrow, set));
            }
        }

        if self.verbose > 0 && !report.commands.is_empty() {
            out.push_str(&format!("\n  Commands ({}):\n", report.commands.len()));
            for command in &report.commands {
                out.push_str(&format!("    {}\n", command));
            }
        }

        if !report.warnings.is_empty() {
            out.push_str(&format!("\n  Warnings ({}):\n", report.warnings.len()));
            for warning in &report.warnings {
                out.push_str(&format!(
                    "    {} {}\n",
                    self.paint(icons.warn, Color::Yellow),
                    warning
                ));
            }
        }

        out.push_str(&format!(
            "\n  Finished in {:.1}s\n",
            report.elapsed_ms as f64 / 1000.0
        ));
        out
    }

    fn render_plan(&self, report: &DeployReport) -> String {
        let mut out = format!(
            "Plan for {} on {}\n\n",
            report.service,
            Self::target(report)
        );
        let width = report.commands.len().to_string().len();
        for (i, command) in report.commands.iter().enumerate() {
            out.push_str(&format!("  {:>width$}. {}\n", i + 1, command, width = width));
        }
        for skipped in &report.skipped {
            out.push_str(&format!(
                "\n  {} {} skipped: {}",
                self.icons().skip,
                skipped.stage,
                skipped.reason
            ));
        }
        if !report.skipped.is_empty() {
            out.push('\n');
        }
        out
    }

    fn render_check(&self, result: &CheckResult, config_path: &Path) -> String {
        let icons = self.icons();
        let mut out = format!("Checks for {}\n\n", config_path.display());

        for item in &result.items {
            let icon = match item.status {
                CheckStatus::Pass => self.paint(icons.check, Color::Green),
                CheckStatus::Warning => self.paint(icons.warn, Color::Yellow),
                CheckStatus::Error => self.paint(icons.cross, Color::Red),
            };
            out.push_str(&format!("  {} {}: {}", icon, item.name, item.message));
            if self.verbose > 0 || item.status != CheckStatus::Pass {
                out.push_str(&format!(" ({})", item.path.display()));
            }
            out.push('\n');
        }

        out.push_str(&format!(
            "\n  {} passed, {} warnings, {} errors\n",
            result.passed, result.warnings, result.errors
        ));
        out
    }
}

/// JSON renderer; every document is a single line
pub struct JsonRenderer;

impl JsonRenderer {
    fn line(event: &str, body: serde_json::Value) -> String {
        let mut value = body;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("event".to_string(), serde_json::Value::from(event));
        }
        format!("{}\n", serde_json::to_string(&value).unwrap_or_default())
    }
}

impl ReportRenderer for JsonRenderer {
    fn render_report(&self, report: &DeployReport) -> String {
        let body = serde_json::to_value(report).unwrap_or_else(|_| serde_json::json!({}));
        Self::line("report", body)
    }

    fn render_plan(&self, report: &DeployReport) -> String {
        Self::line(
            "plan",
            serde_json::json!({
                "destination": report.destination,
                "service": report.service,
                "remote_dir": report.remote_dir,
                "commands": report.commands,
                "skipped": report.skipped,
            }),
        )
    }

    fn render_check(&self, result: &CheckResult, config_path: &Path) -> String {
        let mut body = serde_json::to_value(result).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "config".to_string(),
                serde_json::Value::from(config_path.display().to_string()),
            );
            obj.insert(
                "success".to_string(),
                serde_json::Value::from(result.is_success()),
            );
        }
        Self::line("check", body)
    }
}

/// Create a renderer based on format
pub fn create_renderer(
    format: OutputFormat,
    color: bool,
    unicode: bool,
    verbose: u8,
) -> Box<dyn ReportRenderer> {
    match format {
        OutputFormat::Text => Box::new(TextRenderer {
            color,
            unicode,
            verbose,
        }),
        OutputFormat::Json => Box::new(JsonRenderer),
    }
}
