//! Deploy Use Case
//!
//! Orchestrates one deployment run:
//! 1. Verify local preconditions (no network yet)
//! 2. Open the remote session
//! 3. Run source, build, migrate, cutover, cleanup in order
//! 4. Close the session on every exit path
//!
//! Any stage failure except cleanup aborts the run immediately. There is no
//! retry and no rollback.

use std::time::Instant;

use tracing::{info, warn};

use crate::application::preconditions;
use crate::application::stages::{run_stage, StageContext};
use crate::config::DeployConfig;
use crate::domain::ports::{DeployEvent, DeployEventSink, RemoteSession, SessionFactory};
use crate::domain::{Stage, StageOutcome};
use crate::error::{CleanupWarning, DeployResult};

use super::options::DeployOptions;
use super::result::{DeployReport, SkippedStage};

/// Closes the session when dropped, unless closed explicitly first
struct SessionGuard<S: RemoteSession> {
    session: S,
    closed: bool,
}

impl<S: RemoteSession> SessionGuard<S> {
    fn new(session: S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    fn close(&mut self) -> DeployResult<()> {
        self.closed = true;
        self.session.close()
    }
}

impl<S: RemoteSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.session.close() {
                warn!("failed to close session: {}", e);
            }
        }
    }
}

/// Deploy use case, parameterized by how sessions are opened
pub struct DeployUseCase<F: SessionFactory> {
    factory: F,
}

impl<F: SessionFactory> DeployUseCase<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Run the full pipeline
    pub fn execute(
        &self,
        config: &DeployConfig,
        options: &DeployOptions,
        events: &dyn DeployEventSink,
    ) -> DeployResult<DeployReport> {
        let started = Instant::now();

        preconditions::validate(config)?;

        events.on_event(DeployEvent::Started {
            destination: config.destination(),
            service: config.service.clone(),
            source: config.source.describe(),
            dry_run: options.dry_run,
        });

        let mut guard = SessionGuard::new(self.factory.open(config)?);
        let destination = guard.session.describe();
        info!(destination = %destination, "session open");
        events.on_event(DeployEvent::Connected { destination });

        // On failure the guard closes the session as it goes out of scope.
        let mut report = run_pipeline(&mut guard.session, config, options, events)?;

        if let Err(e) = guard.close() {
            warn!("failed to close session: {}", e);
            report
                .warnings
                .push(CleanupWarning::new("close session", e.to_string()));
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        events.on_event(DeployEvent::Completed {
            elapsed: started.elapsed(),
            warnings: report.warnings.len(),
        });
        info!(
            elapsed_ms = report.elapsed_ms,
            warnings = report.warnings.len(),
            "deploy finished"
        );
        Ok(report)
    }
}

fn run_pipeline(
    session: &mut dyn RemoteSession,
    config: &DeployConfig,
    options: &DeployOptions,
    events: &dyn DeployEventSink,
) -> DeployResult<DeployReport> {
    let mut ctx = StageContext::new(session, config, options, events);
    let mut report = DeployReport {
        destination: config.destination(),
        service: config.service.clone(),
        dry_run: options.dry_run,
        ..DeployReport::default()
    };

    for stage in Stage::PIPELINE {
        events.on_event(DeployEvent::StageStarted { stage });
        info!(stage = %stage, "stage started");
        let stage_started = Instant::now();

        match run_stage(stage, &mut ctx) {
            Ok(StageOutcome::Skipped { reason }) => {
                info!(stage = %stage, reason = %reason, "stage skipped");
                events.on_event(DeployEvent::StageSkipped {
                    stage,
                    reason: reason.clone(),
                });
                report.skipped.push(SkippedStage { stage, reason });
            }
            Ok(outcome) => {
                report.warnings.extend(outcome.warnings().iter().cloned());
                report.completed.push(stage);
                events.on_event(DeployEvent::StageCompleted {
                    stage,
                    elapsed: stage_started.elapsed(),
                });
            }
            Err(e) => {
                warn!(stage = %stage, "stage failed: {}", e);
                events.on_event(DeployEvent::StageFailed {
                    stage,
                    error: e.to_string(),
                });
                return Err(e.in_stage(stage));
            }
        }
    }

    report.remote_dir = ctx.remote_dir;
    report.migrations = ctx.migrations;
    report.commands = ctx.commands;
    Ok(report)
}
