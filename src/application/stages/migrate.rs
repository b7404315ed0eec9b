//! Migrate stage
//!
//! Each migration set is a directory of the synced tree. Sets run one at a
//! time in a one-shot container that mounts the tree, so migrations always
//! match the code that is about to go live.

use std::collections::BTreeSet;

use tracing::info;

use super::StageContext;
use crate::config::MigrationPlan;
use crate::domain::{remote_join, RemoteCommand, StageOutcome};
use crate::error::DeployResult;

pub(super) fn run(ctx: &mut StageContext<'_>) -> DeployResult<StageOutcome> {
    if ctx.options.skip_migrations {
        return Ok(StageOutcome::skipped("--skip-migrations"));
    }

    let (sets, command) = match &ctx.config.migrations {
        MigrationPlan::Disabled => return Ok(StageOutcome::skipped("migrations disabled")),
        MigrationPlan::Explicit { sets, command } => (sets.clone(), command.clone()),
        MigrationPlan::Discover { marker, command } => {
            let marker = marker.clone();
            (discover(ctx, &marker)?, command.clone())
        }
    };

    if sets.is_empty() {
        info!("nothing to migrate");
        return Ok(StageOutcome::Completed);
    }

    let compose = ctx.compose();
    let service = ctx.config.service.clone();
    let workdir = ctx.config.container_workdir.clone();
    let mounts = [(ctx.remote_dir.clone(), workdir.clone())];

    for set in sets {
        info!(set = %display_set(&set), "applying migrations");
        ctx.run(compose.run_one_shot(&service, &remote_join(&workdir, &set), &mounts, &command))?;
        ctx.migrations.push(display_set(&set));
    }
    Ok(StageOutcome::Completed)
}

/// Directories (relative to the tree root) holding a marker file, sorted
fn discover(ctx: &mut StageContext<'_>, marker: &str) -> DeployResult<Vec<String>> {
    let dir = ctx.remote_dir.clone();
    let out = ctx.run(RemoteCommand::new("find").args([
        dir.as_str(),
        "-name",
        marker,
        "-not",
        "-path",
        "*/.git/*",
        "-type",
        "f",
    ]))?;
    Ok(parse_marker_paths(&dir, out.lines()))
}

fn parse_marker_paths<'a>(root: &str, lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let prefix = format!("{}/", root.trim_end_matches('/'));
    let sets: BTreeSet<String> = lines
        .filter_map(|line| line.strip_prefix(prefix.as_str()))
        .map(|rel| match rel.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        })
        .collect();
    sets.into_iter().collect()
}

fn display_set(set: &str) -> String {
    if set.is_empty() {
        ".".to_string()
    } else {
        set.to_string()
    }
}
