//! Deploy Options
//!
//! Per-run toggles from the command line. They never change what is
//! deployed, only how the run behaves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Options for the deploy use case
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Rebuild every image layer
    pub no_cache: bool,
    /// Do not run the migrate stage
    pub skip_migrations: bool,
    /// Record the command sequence without executing it
    pub dry_run: bool,
    /// Set from a signal handler to stop before the next remote command
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    pub fn with_skip_migrations(mut self, skip: bool) -> Self {
        self.skip_migrations = skip;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
