//! Deploy Report
//!
//! Summary of one successful run.

use serde::Serialize;

use crate::domain::Stage;
use crate::error::CleanupWarning;

/// A stage that did not run, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStage {
    pub stage: Stage,
    pub reason: String,
}

/// Result of a deploy run that reached the end of the pipeline
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeployReport {
    pub destination: String,
    pub service: String,
    /// Resolved remote working directory
    pub remote_dir: String,
    pub dry_run: bool,
    /// Stages that ran to completion, in order
    pub completed: Vec<Stage>,
    pub skipped: Vec<SkippedStage>,
    /// Migration sets applied, in order
    pub migrations: Vec<String>,
    pub warnings: Vec<CleanupWarning>,
    /// Every issued command and upload, in order
    pub commands: Vec<String>,
    pub elapsed_ms: u64,
}

impl DeployReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
