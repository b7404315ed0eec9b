//! key=value configuration loading
//!
//! Line rules: blank and `#` lines are skipped, the first `=` splits key from
//! value, both sides are trimmed, one pair of surrounding quotes is stripped
//! from the value, and a later occurrence of a key overwrites an earlier one.
//! Lines without `=` are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

use super::types::*;

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub line: usize,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' on line {}", self.key, self.line)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// A value together with the line it was last set on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub value: String,
    pub line: usize,
}

/// Parsed key=value pairs, keyed by canonical lowercase key
pub type ConfigEntries = BTreeMap<String, ConfigEntry>;

const KNOWN_KEYS: &[&str] = &[
    "host",
    "user",
    "port",
    "ssh_key",
    "remote_dir",
    "service",
    "mode",
    "repo_url",
    "branch",
    "project_dir",
    "compose_file",
    "env_file",
    "compose_command",
    "migrations",
    "migration_marker",
    "migration_command",
    "container_workdir",
    "remote_tmp_dir",
    "command_timeout_secs",
    "connect_timeout_secs",
    "archive_exclude",
];

/// Spellings carried over from older deploy scripts
const KEY_ALIASES: &[(&str, &str)] = &[
    ("remote_host", "host"),
    ("remote_user", "user"),
    ("key", "ssh_key"),
    ("ssh_key_path", "ssh_key"),
    ("remote_path", "remote_dir"),
    ("remote_project_path", "remote_dir"),
    ("repo", "repo_url"),
    ("service_name", "service"),
];

/// Load and validate a config file
///
/// Relative local paths inside the file are resolved against the file's
/// directory.
pub fn load(path: &Path) -> Result<(DeployConfig, Vec<ConfigWarning>), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let entries = parse_entries(&content);
    let config = from_entries(&entries, base_dir)?;
    Ok((config, unknown_key_warnings(&entries)))
}

/// Split file content into entries
///
/// Never fails: lines that do not look like `key=value` are skipped.
pub fn parse_entries(content: &str) -> ConfigEntries {
    let mut entries = ConfigEntries::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let key = key.strip_prefix("export ").map(str::trim).unwrap_or(key);
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            continue;
        }

        entries.insert(
            canonical_key(key),
            ConfigEntry {
                value: unquote(value.trim()).to_string(),
                line: idx + 1,
            },
        );
    }

    entries
}

/// Build a [`DeployConfig`] from parsed entries
pub fn from_entries(entries: &ConfigEntries, base_dir: &Path) -> Result<DeployConfig, ConfigError> {
    let host = required(entries, "host")?;
    let user = required(entries, "user")?;
    let ssh_key = resolve_local(&required(entries, "ssh_key")?, base_dir);
    let remote_dir = validate_remote_dir(&required(entries, "remote_dir")?)?;
    let service = required(entries, "service")?;

    let port = match value(entries, "port") {
        Some(raw) => raw
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| ConfigError::invalid("port", raw, "expected a port number 1-65535"))?,
        None => DEFAULT_PORT,
    };

    let mode = match value(entries, "mode") {
        Some(raw) => raw.to_ascii_lowercase(),
        None if value(entries, "repo_url").is_some() => "git".to_string(),
        None if value(entries, "project_dir").is_some() => "archive".to_string(),
        None => return Err(ConfigError::missing("repo_url")),
    };
    let source = match mode.as_str() {
        "git" => SourceRef::Git {
            repo_url: required(entries, "repo_url")?,
            branch: required(entries, "branch")?,
        },
        "archive" => SourceRef::Archive {
            project_dir: resolve_local(&required(entries, "project_dir")?, base_dir),
        },
        _ => {
            return Err(ConfigError::invalid(
                "mode",
                mode.as_str(),
                "expected 'git' or 'archive'",
            ))
        }
    };

    let migration_command = split_command(
        "migration_command",
        value(entries, "migration_command").unwrap_or(DEFAULT_MIGRATION_COMMAND),
    )?;
    let migrations = match value(entries, "migrations") {
        Some(raw) if matches!(raw.to_ascii_lowercase().as_str(), "none" | "off" | "false") => {
            MigrationPlan::Disabled
        }
        Some(raw) => MigrationPlan::Explicit {
            sets: split_list(raw),
            command: migration_command,
        },
        None => MigrationPlan::Discover {
            marker: value(entries, "migration_marker")
                .unwrap_or(DEFAULT_MIGRATION_MARKER)
                .to_string(),
            command: migration_command,
        },
    };

    Ok(DeployConfig {
        host,
        user,
        port,
        ssh_key,
        remote_dir,
        service,
        source,
        compose_file: resolve_local(value(entries, "compose_file").unwrap_or(DEFAULT_COMPOSE_FILE), base_dir),
        env_file: resolve_local(value(entries, "env_file").unwrap_or(DEFAULT_ENV_FILE), base_dir),
        compose_command: value(entries, "compose_command")
            .unwrap_or(DEFAULT_COMPOSE_COMMAND)
            .to_string(),
        migrations,
        container_workdir: value(entries, "container_workdir")
            .unwrap_or(DEFAULT_CONTAINER_WORKDIR)
            .to_string(),
        remote_tmp_dir: value(entries, "remote_tmp_dir")
            .unwrap_or(DEFAULT_REMOTE_TMP_DIR)
            .to_string(),
        command_timeout: parse_secs("command_timeout_secs", value(entries, "command_timeout_secs"))?
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT),
        connect_timeout: parse_secs("connect_timeout_secs", value(entries, "connect_timeout_secs"))?
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        archive_excludes: value(entries, "archive_exclude").map(split_list).unwrap_or_default(),
    })
}

fn value<'a>(entries: &'a ConfigEntries, key: &str) -> Option<&'a str> {
    entries
        .get(key)
        .map(|e| e.value.as_str())
        .filter(|v| !v.is_empty())
}

fn required(entries: &ConfigEntries, key: &str) -> Result<String, ConfigError> {
    value(entries, key)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::missing(key))
}

/// Warnings for keys the loader does not understand
pub fn unknown_key_warnings(entries: &ConfigEntries) -> Vec<ConfigWarning> {
    entries
        .iter()
        .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
        .map(|(key, entry)| ConfigWarning {
            key: key.clone(),
            line: entry.line,
            suggestion: suggest_key(key),
        })
        .collect()
}

fn canonical_key(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lower)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_command(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let words: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    if words.is_empty() {
        return Err(ConfigError::invalid(key, raw, "command must not be empty"));
    }
    Ok(words)
}

fn parse_secs(key: &str, raw: Option<&str>) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .map(|s| Some(Duration::from_secs(s)))
        .ok_or_else(|| ConfigError::invalid(key, raw, "expected a positive number of seconds"))
}

fn validate_remote_dir(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "~" {
        return Err(ConfigError::invalid(
            "remote_dir",
            raw,
            "refusing to deploy into the filesystem root or home directory",
        ));
    }
    if !trimmed.starts_with('/') && !trimmed.starts_with("~/") {
        return Err(ConfigError::invalid(
            "remote_dir",
            raw,
            "must be an absolute path or start with ~/",
        ));
    }
    Ok(trimmed.to_string())
}

/// Resolve a local path from the config file
///
/// `~` expands to the operator's home directory; relative paths are taken
/// from `base_dir`.
fn resolve_local(raw: &str, base_dir: &Path) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn suggest_key(unknown: &str) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for candidate in KNOWN_KEYS {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
