//! Deploy Event Port
//!
//! Provides an observable interface for deploy runs.
//! Enables console progress, JSON event streams, and debugging.

use std::time::Duration;

use crate::domain::stage::Stage;

/// Event emitted during a deploy run
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// Run started, session not yet open
    Started {
        destination: String,
        service: String,
        source: String,
        dry_run: bool,
    },

    /// Session established
    Connected { destination: String },

    StageStarted { stage: Stage },

    /// A remote command (or upload) is about to be issued
    CommandStarted { stage: Stage, command: String },

    StageCompleted { stage: Stage, elapsed: Duration },

    StageSkipped { stage: Stage, reason: String },

    /// Stage failed; the run aborts unless the stage is best-effort
    StageFailed { stage: Stage, error: String },

    /// Non-fatal problem in a best-effort step
    Warning { stage: Stage, message: String },

    /// Run finished successfully
    Completed { elapsed: Duration, warnings: usize },
}

/// Trait for receiving deploy events
///
/// Implementations can be:
/// - ConsoleEventSink: Progress display in terminal
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait DeployEventSink {
    /// Handle a deploy event
    fn on_event(&self, event: DeployEvent);

    /// Check if this sink wants per-command events
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {}

    fn wants_detailed_events(&self) -> bool {
        false
    }
}
