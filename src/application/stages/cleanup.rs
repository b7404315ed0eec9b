//! Cleanup stage
//!
//! Best effort: every failure becomes a [`CleanupWarning`] and the stage
//! still completes.

use tracing::warn;

use super::StageContext;
use crate::domain::ports::DeployEvent;
use crate::domain::{RemoteCommand, StageOutcome};
use crate::error::{CleanupWarning, DeployError};

pub(super) fn run(ctx: &mut StageContext<'_>) -> Result<StageOutcome, DeployError> {
    let mut warnings = Vec::new();

    let prune = ctx.compose().prune_images();
    if let Some(w) = attempt(ctx, "prune images", prune)? {
        warnings.push(w);
    }

    for artifact in std::mem::take(&mut ctx.artifacts) {
        let remove = RemoteCommand::new("rm").args(["-f", artifact.as_str()]);
        if let Some(w) = attempt(ctx, &format!("remove {}", artifact), remove)? {
            warnings.push(w);
        }
    }

    if warnings.is_empty() {
        Ok(StageOutcome::Completed)
    } else {
        Ok(StageOutcome::Degraded { warnings })
    }
}

/// Run one best-effort command; only an interrupt is an error
fn attempt(
    ctx: &mut StageContext<'_>,
    action: &str,
    command: RemoteCommand,
) -> Result<Option<CleanupWarning>, DeployError> {
    let message = match ctx.probe(command) {
        Ok(out) if out.success() => return Ok(None),
        Ok(out) if out.output.trim().is_empty() => format!("exited with status {}", out.status),
        Ok(out) => format!("exited with status {}: {}", out.status, out.output.trim()),
        Err(DeployError::Interrupted) => return Err(DeployError::Interrupted),
        Err(e) => e.to_string(),
    };

    let warning = CleanupWarning::new(action, message);
    warn!("{}", warning);
    ctx.emit(DeployEvent::Warning {
        stage: ctx.stage,
        message: warning.to_string(),
    });
    Ok(Some(warning))
}
