//! Cutover stage
//!
//! Converges the service declaratively, then confirms it is running. No
//! imperative stop or remove is ever issued, so re-running cutover against
//! an already-converged host is a no-op for Compose.

use tracing::info;

use super::StageContext;
use crate::domain::StageOutcome;
use crate::error::{DeployError, DeployResult};

pub(super) fn run(ctx: &mut StageContext<'_>) -> DeployResult<StageOutcome> {
    let service = ctx.config.service.clone();
    let compose = ctx.compose();

    ctx.run(compose.converge(&[service.as_str()]))?;

    let running = ctx.run(compose.list_running_services())?;
    if ctx.options.dry_run {
        return Ok(StageOutcome::Completed);
    }

    let running: Vec<String> = running.lines().map(str::to_string).collect();
    if !running.iter().any(|s| s == &service) {
        return Err(DeployError::ServiceNotRunning { service, running });
    }
    info!(service = %service, "service running");
    Ok(StageOutcome::Completed)
}
