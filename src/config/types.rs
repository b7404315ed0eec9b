//! Configuration types

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_COMPOSE_COMMAND: &str = "docker compose";
pub const DEFAULT_CONTAINER_WORKDIR: &str = "/app";
pub const DEFAULT_MIGRATION_MARKER: &str = "alembic.ini";
pub const DEFAULT_MIGRATION_COMMAND: &str = "alembic upgrade head";
pub const DEFAULT_REMOTE_TMP_DIR: &str = "/tmp";
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the code being deployed comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Remote host checks out `branch` of `repo_url`
    Git { repo_url: String, branch: String },
    /// Local directory is archived and pushed
    Archive { project_dir: PathBuf },
}

impl SourceRef {
    pub fn mode(&self) -> &'static str {
        match self {
            SourceRef::Git { .. } => "git",
            SourceRef::Archive { .. } => "archive",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceRef::Git { repo_url, branch } => format!("{} ({})", repo_url, branch),
            SourceRef::Archive { project_dir } => project_dir.display().to_string(),
        }
    }
}

/// Which migration sets run before cutover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationPlan {
    /// Find every `marker` file under the synced tree; sets run in sorted path order
    Discover { marker: String, command: Vec<String> },
    /// Exactly these directories (relative to the project root), in this order
    Explicit { sets: Vec<String>, command: Vec<String> },
    Disabled,
}

/// Immutable per-run deployment settings
///
/// Built once by the loader; every required field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub host: String,
    pub user: String,
    pub port: u16,
    /// Private key used for authentication
    pub ssh_key: PathBuf,
    /// Working directory on the remote host
    pub remote_dir: String,
    /// Compose service being deployed
    pub service: String,
    pub source: SourceRef,
    /// Local compose file, uploaded next to the synced sources
    pub compose_file: PathBuf,
    /// Local environment file, uploaded as `<remote_dir>/.env`
    pub env_file: PathBuf,
    pub compose_command: String,
    pub migrations: MigrationPlan,
    /// Mount point of the synced source inside one-shot containers
    pub container_workdir: String,
    /// Remote directory for uploaded archives
    pub remote_tmp_dir: String,
    pub command_timeout: Duration,
    pub connect_timeout: Duration,
    /// Extra archive exclusions (gitignore-style globs)
    pub archive_excludes: Vec<String>,
}

impl DeployConfig {
    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Compose file name as seen from the remote working directory
    pub fn compose_file_name(&self) -> String {
        file_name_or(&self.compose_file, DEFAULT_COMPOSE_FILE)
    }

    /// Every local file that must exist before any network action
    pub fn required_local_files(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("ssh_key", self.ssh_key.as_path()),
            ("compose_file", self.compose_file.as_path()),
            ("env_file", self.env_file.as_path()),
        ]
    }
}

fn file_name_or(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string())
}
