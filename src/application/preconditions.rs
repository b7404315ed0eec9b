//! Precondition checks
//!
//! Everything that can be verified on the operator's machine is verified
//! before the first network action: local files exist and are readable,
//! the compose file declares the service, archive sources exist.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::{DeployConfig, SourceRef};
use crate::error::{DeployError, DeployResult};
use crate::infrastructure::compose_file::declared_services;

/// Result of a single local check
#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    /// Name of the check (e.g. `ssh_key`)
    pub name: String,
    /// Path the check looked at
    pub path: PathBuf,
    pub status: CheckStatus,
    /// Human-readable message
    pub message: String,
}

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

/// Result of all precondition checks
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub items: Vec<CheckItem>,
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl CheckResult {
    /// Check if all checks passed (no errors)
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    fn push(&mut self, item: CheckItem) {
        match item.status {
            CheckStatus::Pass => self.passed += 1,
            CheckStatus::Warning => self.warnings += 1,
            CheckStatus::Error => self.errors += 1,
        }
        debug!(check = %item.name, status = ?item.status, "{}", item.message);
        self.items.push(item);
    }

    /// First failing check as an error
    pub fn into_error(self) -> Option<DeployError> {
        self.items
            .into_iter()
            .find(|i| i.status == CheckStatus::Error)
            .map(|i| DeployError::precondition(i.path, format!("{}: {}", i.name, i.message)))
    }
}

fn item(name: &str, path: &Path, status: CheckStatus, message: impl Into<String>) -> CheckItem {
    CheckItem {
        name: name.to_string(),
        path: path.to_path_buf(),
        status,
        message: message.into(),
    }
}

/// Run every check and collect the results
pub fn inspect(config: &DeployConfig) -> CheckResult {
    let mut result = CheckResult::default();

    for (name, path) in config.required_local_files() {
        result.push(check_readable_file(name, path));
    }

    if let Some(warning) = key_permission_warning(&config.ssh_key) {
        result.push(warning);
    }

    result.push(check_service_declared(config));

    if let SourceRef::Archive { project_dir } = &config.source {
        result.push(if project_dir.is_dir() {
            item("project_dir", project_dir, CheckStatus::Pass, "directory exists")
        } else {
            item(
                "project_dir",
                project_dir,
                CheckStatus::Error,
                "project directory not found",
            )
        });
    }

    result
}

/// Fail with the first failing check, otherwise return all results
pub fn validate(config: &DeployConfig) -> DeployResult<CheckResult> {
    let result = inspect(config);
    if result.is_success() {
        Ok(result)
    } else {
        Err(result
            .into_error()
            .unwrap_or_else(|| DeployError::precondition(&config.ssh_key, "check failed")))
    }
}

fn check_readable_file(name: &str, path: &Path) -> CheckItem {
    if !path.exists() {
        return item(name, path, CheckStatus::Error, "file not found");
    }
    if !path.is_file() {
        return item(name, path, CheckStatus::Error, "not a regular file");
    }
    match File::open(path) {
        Ok(_) => item(name, path, CheckStatus::Pass, "readable"),
        Err(e) => item(name, path, CheckStatus::Error, format!("not readable: {}", e)),
    }
}

fn check_service_declared(config: &DeployConfig) -> CheckItem {
    let path = config.compose_file.as_path();
    if !path.is_file() {
        // Already reported by the readable-file check
        return item(
            "compose_service",
            path,
            CheckStatus::Error,
            "compose file missing",
        );
    }
    match declared_services(path) {
        Ok(services) if services.iter().any(|s| s == &config.service) => item(
            "compose_service",
            path,
            CheckStatus::Pass,
            format!("service '{}' declared", config.service),
        ),
        Ok(services) => item(
            "compose_service",
            path,
            CheckStatus::Error,
            format!(
                "service '{}' is not declared (found: {})",
                config.service,
                if services.is_empty() {
                    "none".to_string()
                } else {
                    services.join(", ")
                }
            ),
        ),
        Err(e) => item("compose_service", path, CheckStatus::Error, e.to_string()),
    }
}

#[cfg(unix)]
fn key_permission_warning(path: &Path) -> Option<CheckItem> {
    use std::os::unix::fs::PermissionsExt;

    let mode = path.metadata().ok()?.permissions().mode();
    if mode & 0o077 != 0 {
        Some(item(
            "ssh_key_permissions",
            path,
            CheckStatus::Warning,
            format!(
                "key is accessible by other users (mode {:o}); ssh may refuse it",
                mode & 0o777
            ),
        ))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn key_permission_warning(_path: &Path) -> Option<CheckItem> {
    None
}
