//! JSON Event Sink
//!
//! Outputs deploy events as NDJSON for CI/automation consumption.

use crate::domain::ports::{DeployEvent, DeployEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

/// JSON form of one event
pub fn event_json(event: &DeployEvent) -> serde_json::Value {
    match event {
        DeployEvent::Started {
            destination,
            service,
            source,
            dry_run,
        } => serde_json::json!({
            "event": "start",
            "command": "deploy",
            "destination": destination,
            "service": service,
            "source": source,
            "dry_run": dry_run,
        }),

        DeployEvent::Connected { destination } => serde_json::json!({
            "event": "connected",
            "destination": destination,
        }),

        DeployEvent::StageStarted { stage } => serde_json::json!({
            "event": "stage_start",
            "stage": stage.name(),
        }),

        DeployEvent::CommandStarted { stage, command } => serde_json::json!({
            "event": "command",
            "stage": stage.name(),
            "command": command,
        }),

        DeployEvent::StageCompleted { stage, elapsed } => serde_json::json!({
            "event": "stage_complete",
            "stage": stage.name(),
            "elapsed_ms": elapsed.as_millis() as u64,
        }),

        DeployEvent::StageSkipped { stage, reason } => serde_json::json!({
            "event": "stage_skipped",
            "stage": stage.name(),
            "reason": reason,
        }),

        DeployEvent::StageFailed { stage, error } => serde_json::json!({
            "event": "stage_failed",
            "stage": stage.name(),
            "error": error,
        }),

        DeployEvent::Warning { stage, message } => serde_json::json!({
            "event": "warning",
            "stage": stage.name(),
            "message": message,
        }),

        DeployEvent::Completed { elapsed, warnings } => {
            let status = if *warnings == 0 { "success" } else { "degraded" };
            serde_json::json!({
                "event": "complete",
                "command": "deploy",
                "status": status,
                "warnings": warnings,
                "elapsed_ms": elapsed.as_millis() as u64,
            })
        }
    }
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        self.write_event(event_json(&event));
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}
