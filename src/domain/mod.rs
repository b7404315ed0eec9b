//! Domain Layer
//!
//! The deployment vocabulary, free of process spawning and network access.
//!
//! ## Structure
//!
//! - `stage` - The five pipeline stages and their outcomes
//! - `command` - Structured remote commands with shell quoting
//! - `compose` - The container runtime control surface (compose commands)
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer never spawns processes or touches the network
//! 2. **Structured commands** - Values travel as arguments, never spliced into shell text
//! 3. **Ports & Adapters** - All remote access goes through trait-defined ports

pub mod command;
pub mod compose;
pub mod ports;
pub mod stage;

pub use command::{remote_join, shell_quote, RemoteCommand};
pub use compose::ComposeRuntime;
pub use stage::{Stage, StageOutcome};
