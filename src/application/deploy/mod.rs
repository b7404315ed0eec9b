//! Deploy Module
//!
//! Runs the five-stage pipeline against one remote session.
//!
//! ## Structure
//!
//! - `options` - Per-run toggles (`DeployOptions`)
//! - `result` - Run summary (`DeployReport`)
//! - `use_case` - Core use case logic (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use dockhand::application::deploy::{DeployOptions, DeployUseCase};
//! use dockhand::infrastructure::SshSessionFactory;
//!
//! let use_case = DeployUseCase::new(SshSessionFactory);
//! let report = use_case.execute(&config, &DeployOptions::new(), &sink)?;
//! ```

mod options;
mod result;
mod use_case;

pub use options::DeployOptions;
pub use result::{DeployReport, SkippedStage};
pub use use_case::DeployUseCase;
