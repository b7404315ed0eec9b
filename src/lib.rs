//! Dockhand - remote container deployment orchestrator
//!
//! Dockhand drives one remote host over SSH and sequences a fixed pipeline
//! for a single Docker Compose service: source sync, image build,
//! migrations in a one-shot container, declarative cutover and cleanup.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    CheckResult, CheckStatus, DeployOptions, DeployReport, DeployUseCase, SkippedStage,
};
pub use config::{DeployConfig, MigrationPlan, SourceRef};
pub use domain::{ComposeRuntime, RemoteCommand, Stage, StageOutcome};
pub use error::{CleanupWarning, ConfigError, DeployError, DeployResult};
pub use presentation::SessionMode;
