//! Project archive assembly
//!
//! Packs a local project directory into a gzip-compressed tarball for
//! archive-push deploys. Exclusions use gitignore semantics (via the
//! `ignore` crate); the project's own `.gitignore` is not consulted, so
//! what ships is exactly the tree minus the exclusion list.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{ConfigError, DeployError, DeployResult};

/// Always excluded: secrets, VCS metadata, caches, earlier deploy archives
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".env",
    ".env.*",
    "__pycache__",
    "*.pyc",
    ".pytest_cache",
    ".mypy_cache",
    ".venv",
    "node_modules",
    "target",
    "*.tar.gz",
];

/// One entry of the archive, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// A finished archive in a private temporary directory
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct BuiltArchive {
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the archive file
    pub sha256: String,
    pub file_count: usize,
    pub size: u64,
    _dir: TempDir,
}

/// Builds archives of one project directory
#[derive(Debug)]
pub struct ArchiveBuilder {
    root: PathBuf,
    matcher: Gitignore,
}

impl ArchiveBuilder {
    /// Prepare a builder with the default exclusions plus `extra`
    pub fn new(root: &Path, extra: &[String]) -> DeployResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in DEFAULT_EXCLUDES {
            builder
                .add_line(None, pattern)
                .map_err(|e| ConfigError::invalid("archive_exclude", *pattern, e.to_string()))?;
        }
        for pattern in extra {
            builder
                .add_line(None, pattern)
                .map_err(|e| ConfigError::invalid("archive_exclude", pattern, e.to_string()))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| ConfigError::invalid("archive_exclude", extra.join(","), e.to_string()))?;

        Ok(Self {
            root: root.to_path_buf(),
            matcher,
        })
    }

    /// Whether a path relative to the project root is left out
    pub fn is_excluded(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }

    /// Entries that will be packed, in stable (sorted) order
    pub fn collect(&self) -> DeployResult<Vec<ArchiveEntry>> {
        if !self.root.is_dir() {
            return Err(DeployError::precondition(
                &self.root,
                "project directory does not exist",
            ));
        }

        let root = self.root.clone();
        let matcher = self.matcher.clone();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                match entry.path().strip_prefix(&root) {
                    Ok(rel) => !matcher.matched_path_or_any_parents(rel, is_dir).is_ignore(),
                    Err(_) => false,
                }
            })
            .build();

        let mut entries = Vec::new();
        for result in walker {
            let entry = result.map_err(|e| io::Error::other(e.to_string()))?;
            if entry.depth() == 0 {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| io::Error::other(e.to_string()))?
                .to_path_buf();
            entries.push(ArchiveEntry {
                path: rel,
                is_dir: entry.file_type().is_some_and(|t| t.is_dir()),
            });
        }
        Ok(entries)
    }

    /// Write `<label>.tar.gz` into a fresh temporary directory
    pub fn build(&self, label: &str) -> DeployResult<BuiltArchive> {
        let entries = self.collect()?;
        let dir = tempfile::Builder::new().prefix("dockhand-archive").tempdir()?;
        let path = dir.path().join(format!("{}.tar.gz", label));

        let file = File::create(&path)?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut tar = tar::Builder::new(encoder);
        tar.follow_symlinks(false);

        let mut file_count = 0;
        for entry in &entries {
            let full = self.root.join(&entry.path);
            if entry.is_dir {
                tar.append_dir(&entry.path, &full)?;
            } else {
                tar.append_path_with_name(&full, &entry.path)?;
                file_count += 1;
            }
        }

        let encoder = tar.into_inner()?;
        let writer = encoder.finish()?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        let sha256 = sha256_file(&path)?;
        let size = std::fs::metadata(&path)?.len();
        debug!(
            archive = %path.display(),
            files = file_count,
            size,
            sha256 = %sha256,
            "archive built"
        );

        Ok(BuiltArchive {
            path,
            sha256,
            file_count,
            size,
            _dir: dir,
        })
    }
}

/// Lowercase hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut file = File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
