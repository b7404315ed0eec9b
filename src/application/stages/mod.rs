//! Pipeline stages
//!
//! Each stage is a function over a [`StageContext`]: it issues its commands
//! through the context (which reports them and honours interrupts) and
//! returns a [`StageOutcome`]. Ordering and failure policy live in the use
//! case, not here.

mod build;
mod cleanup;
mod cutover;
mod migrate;
mod source;

use std::path::Path;

use tracing::debug;

use crate::config::DeployConfig;
use crate::domain::ports::{CommandOutput, DeployEvent, DeployEventSink, RemoteSession};
use crate::domain::{ComposeRuntime, RemoteCommand, Stage, StageOutcome};
use crate::error::{DeployError, DeployResult};

use super::deploy::DeployOptions;

pub use source::{ArchivePush, GitSync, SourceStrategy};

/// Mutable state of one run, shared by all stages
pub struct StageContext<'a> {
    pub session: &'a mut dyn RemoteSession,
    pub config: &'a DeployConfig,
    pub options: &'a DeployOptions,
    events: &'a dyn DeployEventSink,
    /// Remote working directory, `~` resolved once connected
    pub remote_dir: String,
    /// Stage currently running
    pub stage: Stage,
    /// Issued commands and uploads, in order
    pub commands: Vec<String>,
    /// Remote temporary files to remove during cleanup
    pub artifacts: Vec<String>,
    /// Migration sets applied
    pub migrations: Vec<String>,
}

impl<'a> StageContext<'a> {
    pub fn new(
        session: &'a mut dyn RemoteSession,
        config: &'a DeployConfig,
        options: &'a DeployOptions,
        events: &'a dyn DeployEventSink,
    ) -> Self {
        Self {
            session,
            config,
            options,
            events,
            remote_dir: config.remote_dir.clone(),
            stage: Stage::Source,
            commands: Vec::new(),
            artifacts: Vec::new(),
            migrations: Vec::new(),
        }
    }

    pub fn compose(&self) -> ComposeRuntime {
        ComposeRuntime::new(
            &self.config.compose_command,
            &self.config.compose_file_name(),
            &self.remote_dir,
        )
    }

    pub fn emit(&self, event: DeployEvent) {
        self.events.on_event(event);
    }

    fn announce(&mut self, line: String) -> DeployResult<()> {
        if self.options.is_interrupted() {
            return Err(DeployError::Interrupted);
        }
        if self.events.wants_detailed_events() {
            self.emit(DeployEvent::CommandStarted {
                stage: self.stage,
                command: line.clone(),
            });
        }
        debug!(stage = %self.stage, "{}", line);
        self.commands.push(line);
        Ok(())
    }

    /// Interrupts kill the transport too; report those as interrupts
    fn settle<T>(&self, result: DeployResult<T>) -> DeployResult<T> {
        match result {
            Err(_) if self.options.is_interrupted() => Err(DeployError::Interrupted),
            other => other,
        }
    }

    /// Run a command that must succeed
    pub fn run(&mut self, command: RemoteCommand) -> DeployResult<CommandOutput> {
        self.announce(command.render())?;
        let result = self.session.run(&command);
        self.settle(result)
    }

    /// Run a command and return its status without judging it
    pub fn probe(&mut self, command: RemoteCommand) -> DeployResult<CommandOutput> {
        self.announce(command.render())?;
        let result = self.session.exec(&command);
        self.settle(result)
    }

    pub fn upload(&mut self, local: &Path, remote: &str) -> DeployResult<()> {
        self.announce(format!("upload {} -> {}", local.display(), remote))?;
        let result = self.session.upload(local, remote);
        self.settle(result)
    }
}

/// Run one stage
pub fn run_stage(stage: Stage, ctx: &mut StageContext<'_>) -> DeployResult<StageOutcome> {
    ctx.stage = stage;
    match stage {
        Stage::Source => source::run(ctx),
        Stage::Build => build::run(ctx),
        Stage::Migrate => migrate::run(ctx),
        Stage::Cutover => cutover::run(ctx),
        Stage::Cleanup => cleanup::run(ctx),
    }
}
