//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `session/` - Remote sessions (SSH, local shell, dry run)
//! - `events/` - Event sinks (console, NDJSON)
//! - `archive` - Project tarball assembly for archive-push deploys
//! - `compose_file` - Compose file inspection

pub mod archive;
pub mod compose_file;
pub mod events;
pub mod session;

// Re-export for convenience
pub use archive::{ArchiveBuilder, BuiltArchive};
pub use events::{ConsoleEventSink, JsonEventSink};
pub use session::{
    DryRunSession, DryRunSessionFactory, LocalSession, LocalSessionFactory, SshSession,
    SshSessionFactory,
};
