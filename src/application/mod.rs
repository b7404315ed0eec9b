//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on the Domain layer (stages, commands, ports)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `DeployUseCase` - Runs the five-stage pipeline over one session
//! - `preconditions` - Local checks that run before any network action

pub mod deploy;
pub mod preconditions;
pub mod stages;

pub use deploy::{DeployOptions, DeployReport, DeployUseCase, SkippedStage};
pub use preconditions::{CheckItem, CheckResult, CheckStatus};
pub use stages::{ArchivePush, GitSync, SourceStrategy, StageContext};
