//! Error types for Dockhand
//!
//! Uses `thiserror` for library errors; the binary wraps them in `anyhow`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::Stage;

/// Result type alias for Dockhand operations
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors raised while loading the key=value config file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be opened or read
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required key is absent or has an empty value
    #[error("missing required config key '{key}'")]
    Missing { key: String },

    /// A key is present but its value cannot be used
    #[error("invalid value '{value}' for config key '{key}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    pub fn invalid(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for a deployment run
#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A local artifact required before any network action is missing
    #[error("precondition failed for {path}: {reason}")]
    Precondition { path: PathBuf, reason: String },

    /// The remote session could not be established (or was lost)
    #[error("cannot connect to {destination}: {message}")]
    Connection {
        destination: String,
        message: String,
    },

    /// A remote command exited with a non-zero status
    #[error("command `{command}` exited with status {status}\n{output}")]
    Execution {
        command: String,
        status: i32,
        output: String,
    },

    /// A remote command did not finish within the configured limit
    #[error("command `{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },

    /// An uploaded file does not match the local copy
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Cutover converged but the service is not in the running set
    #[error("service '{service}' is not running after cutover (running: {})", render_list(.running))]
    ServiceNotRunning {
        service: String,
        running: Vec<String>,
    },

    /// The operator interrupted the run (Ctrl+C)
    #[error("interrupted")]
    Interrupted,

    /// Local I/O failure (archive assembly, staging)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fatal stage failed; the run was aborted
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<DeployError>,
    },
}

impl DeployError {
    pub fn precondition(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Precondition {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn in_stage(self, stage: Stage) -> Self {
        Self::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage that failed, when the error aborted a stage
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Process exit code for this error
    ///
    /// 2 = config/precondition, 3 = connection, 4 = stage failure,
    /// 130 = interrupted, 1 = other.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Precondition { .. } => 2,
            Self::Connection { .. } => 3,
            Self::Interrupted => 130,
            Self::StageFailed { source, .. } => match source.as_ref() {
                Self::Connection { .. } => 3,
                Self::Interrupted => 130,
                _ => 4,
            },
            Self::Execution { .. }
            | Self::Timeout { .. }
            | Self::ChecksumMismatch { .. }
            | Self::ServiceNotRunning { .. } => 4,
            Self::Io(_) => 1,
        }
    }
}

/// Non-fatal outcome of a best-effort step
///
/// Reported to the operator but never changes the run's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupWarning {
    pub action: String,
    pub message: String,
}

impl CleanupWarning {
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_key() {
        let err = ConfigError::missing("host");
        assert_eq!(err.to_string(), "missing required config key 'host'");
    }

    #[test]
    fn test_stage_failure_names_stage() {
        let err = DeployError::Execution {
            command: "docker compose build".to_string(),
            status: 1,
            output: "no space left on device".to_string(),
        }
        .in_stage(Stage::Build);

        let msg = err.to_string();
        assert!(msg.starts_with("build stage failed"));
        assert!(msg.contains("no space left on device"));
        assert_eq!(err.stage(), Some(Stage::Build));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DeployError::from(ConfigError::missing("user")).exit_code(), 2);
        assert_eq!(
            DeployError::precondition("/k", "not found").exit_code(),
            2
        );
        let conn = DeployError::Connection {
            destination: "u@h".to_string(),
            message: "refused".to_string(),
        };
        assert_eq!(conn.exit_code(), 3);
        let timeout = DeployError::Timeout {
            command: "sleep 10".to_string(),
            after: Duration::from_secs(1),
        };
        assert_eq!(timeout.in_stage(Stage::Migrate).exit_code(), 4);
        assert_eq!(DeployError::Interrupted.in_stage(Stage::Build).exit_code(), 130);
    }

    #[test]
    fn test_service_not_running_lists_none() {
        let err = DeployError::ServiceNotRunning {
            service: "bot".to_string(),
            running: vec![],
        };
        assert_eq!(
            err.to_string(),
            "service 'bot' is not running after cutover (running: none)"
        );
    }
}
