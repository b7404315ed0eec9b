//! Console Event Sink
//!
//! Human-readable progress: one line per stage transition, plus the issued
//! commands when verbose.

use std::io::{self, Write};
use std::sync::Mutex;

use crossterm::style::{Color, Stylize};

use crate::domain::ports::{DeployEvent, DeployEventSink};

mod icons {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const PROGRESS: &str = "●";
    pub const SKIPPED: &str = "○";
    pub const ARROW: &str = "↳";
}

mod icons_ascii {
    pub const SUCCESS: &str = "[OK]";
    pub const ERROR: &str = "[FAIL]";
    pub const WARNING: &str = "[WARN]";
    pub const PROGRESS: &str = "[..]";
    pub const SKIPPED: &str = "[--]";
    pub const ARROW: &str = "[>]";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Icon {
    Success,
    Error,
    Warning,
    Progress,
    Skipped,
    Arrow,
}

impl Icon {
    fn render(self, unicode: bool) -> &'static str {
        match (unicode, self) {
            (true, Icon::Success) => icons::SUCCESS,
            (true, Icon::Error) => icons::ERROR,
            (true, Icon::Warning) => icons::WARNING,
            (true, Icon::Progress) => icons::PROGRESS,
            (true, Icon::Skipped) => icons::SKIPPED,
            (true, Icon::Arrow) => icons::ARROW,
            (false, Icon::Success) => icons_ascii::SUCCESS,
            (false, Icon::Error) => icons_ascii::ERROR,
            (false, Icon::Warning) => icons_ascii::WARNING,
            (false, Icon::Progress) => icons_ascii::PROGRESS,
            (false, Icon::Skipped) => icons_ascii::SKIPPED,
            (false, Icon::Arrow) => icons_ascii::ARROW,
        }
    }

    fn color(self) -> Color {
        match self {
            Icon::Success => Color::Green,
            Icon::Error => Color::Red,
            Icon::Warning | Icon::Progress => Color::Yellow,
            Icon::Skipped | Icon::Arrow => Color::DarkGrey,
        }
    }
}

/// Event sink printing progress lines
pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    color: bool,
    unicode: bool,
    verbose: bool,
}

impl ConsoleEventSink {
    /// Progress on stderr
    pub fn stderr(color: bool, unicode: bool, verbose: bool) -> Self {
        Self::with_writer(io::stderr(), color, unicode, verbose)
    }

    pub fn with_writer<W: Write + Send + 'static>(
        writer: W,
        color: bool,
        unicode: bool,
        verbose: bool,
    ) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            color,
            unicode,
            verbose,
        }
    }

    fn icon(&self, icon: Icon) -> String {
        let s = icon.render(self.unicode);
        if self.color {
            format!("{}", s.with(icon.color()))
        } else {
            s.to_string()
        }
    }

    fn line(&self, text: String) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", text);
            let _ = writer.flush();
        }
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        match event {
            DeployEvent::Started {
                destination,
                service,
                source,
                dry_run,
            } => {
                let mode = if dry_run { " (dry run)" } else { "" };
                self.line(format!("Deploying {} to {}{}", service, destination, mode));
                self.line(format!("  source: {}", source));
            }
            DeployEvent::Connected { destination } => {
                self.line(format!("{} connected to {}", self.icon(Icon::Success), destination));
            }
            DeployEvent::StageStarted { stage } => {
                self.line(format!("{} {}", self.icon(Icon::Progress), stage));
            }
            DeployEvent::CommandStarted { command, .. } => {
                if self.verbose {
                    self.line(format!("  {} {}", self.icon(Icon::Arrow), command));
                }
            }
            DeployEvent::StageCompleted { stage, elapsed } => {
                self.line(format!(
                    "{} {} ({:.1}s)",
                    self.icon(Icon::Success),
                    stage,
                    elapsed.as_secs_f64()
                ));
            }
            DeployEvent::StageSkipped { stage, reason } => {
                self.line(format!("{} {} skipped: {}", self.icon(Icon::Skipped), stage, reason));
            }
            DeployEvent::StageFailed { stage, error } => {
                self.line(format!("{} {} failed", self.icon(Icon::Error), stage));
                for line in error.lines() {
                    self.line(format!("    {}", line));
                }
            }
            DeployEvent::Warning { stage, message } => {
                self.line(format!("{} {}: {}", self.icon(Icon::Warning), stage, message));
            }
            DeployEvent::Completed { elapsed, warnings } => {
                let suffix = match warnings {
                    0 => String::new(),
                    1 => " with 1 warning".to_string(),
                    n => format!(" with {} warnings", n),
                };
                self.line(format!(
                    "{} deployed in {:.1}s{}",
                    self.icon(Icon::Success),
                    elapsed.as_secs_f64(),
                    suffix
                ));
            }
        }
    }

    fn wants_detailed_events(&self) -> bool {
        self.verbose
    }
}
