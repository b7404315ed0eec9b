//! Presentation Layer
//!
//! This layer handles:
//! - Creating use cases with infrastructure dependencies
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `factory` - Wires a session transport into the deploy use case
//! - `output` - Report rendering for deploy, plan and check
//!
//! ## Usage
//!
//! ```ignore
//! use dockhand::presentation::factory::{self, SessionMode};
//!
//! let report = factory::execute(SessionMode::Ssh, &config, &options, &events)?;
//! ```

pub mod factory;
pub mod output;

pub use factory::{create_deploy_use_case, SessionMode};
pub use output::{create_renderer, OutputFormat, ReportRenderer};
