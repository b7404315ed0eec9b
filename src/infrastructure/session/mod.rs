//! Session implementations
//!
//! - `SshSession`: OpenSSH control master, commands via `ssh`, files via `scp`
//! - `LocalSession`: local shell, for `--local` and tests
//! - `DryRunSession`: records commands without running them

mod dry_run;
mod local;
mod process;
mod ssh;

pub use dry_run::{DryRunSession, DryRunSessionFactory};
pub use local::{LocalSession, LocalSessionFactory};
pub use ssh::{SshSession, SshSessionFactory};
