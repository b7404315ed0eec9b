//! Pipeline stages

use serde::Serialize;

use crate::error::CleanupWarning;

/// One step of the deployment pipeline
///
/// Stages run strictly in [`Stage::PIPELINE`] order; a stage starts only
/// after the previous one succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Source,
    Build,
    Migrate,
    Cutover,
    Cleanup,
}

impl Stage {
    pub const PIPELINE: [Stage; 5] = [
        Stage::Source,
        Stage::Build,
        Stage::Migrate,
        Stage::Cutover,
        Stage::Cleanup,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Source => "source",
            Stage::Build => "build",
            Stage::Migrate => "migrate",
            Stage::Cutover => "cutover",
            Stage::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Successful result of running one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Skipped { reason: String },
    /// Completed, but best-effort steps reported problems
    Degraded { warnings: Vec<CleanupWarning> },
}

impl StageOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn warnings(&self) -> &[CleanupWarning] {
        match self {
            Self::Degraded { warnings } => warnings,
            _ => &[],
        }
    }
}
