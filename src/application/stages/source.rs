//! Source stage
//!
//! Makes the remote working directory hold exactly the configured code
//! version, then places the environment and compose files next to it.

use std::path::PathBuf;

use tracing::info;

use super::StageContext;
use crate::config::SourceRef;
use crate::domain::{remote_join, RemoteCommand, StageOutcome};
use crate::error::{DeployError, DeployResult};
use crate::infrastructure::ArchiveBuilder;

/// A way of getting the sources onto the remote host
pub trait SourceStrategy {
    /// Short label for logs (`git`, `archive`)
    fn name(&self) -> &'static str;

    /// Leave `ctx.remote_dir` holding exactly the desired tree
    fn sync(&self, ctx: &mut StageContext<'_>) -> DeployResult<()>;
}

/// Remote host checks out the branch tip itself
#[derive(Debug, Clone)]
pub struct GitSync {
    pub repo_url: String,
    pub branch: String,
}

/// Local tree is archived and pushed
#[derive(Debug, Clone)]
pub struct ArchivePush {
    pub project_dir: PathBuf,
    pub excludes: Vec<String>,
}

pub(super) fn run(ctx: &mut StageContext<'_>) -> DeployResult<StageOutcome> {
    resolve_remote_dir(ctx)?;

    let strategy: Box<dyn SourceStrategy> = match &ctx.config.source {
        SourceRef::Git { repo_url, branch } => Box::new(GitSync {
            repo_url: repo_url.clone(),
            branch: branch.clone(),
        }),
        SourceRef::Archive { project_dir } => Box::new(ArchivePush {
            project_dir: project_dir.clone(),
            excludes: ctx.config.archive_excludes.clone(),
        }),
    };
    info!(strategy = strategy.name(), remote_dir = %ctx.remote_dir, "syncing sources");
    strategy.sync(ctx)?;

    upload_companions(ctx)?;
    Ok(StageOutcome::Completed)
}

/// Stands in for the remote home in a dry-run plan
const DRY_RUN_HOME: &str = "<remote-home>";

/// Expand a leading `~/` against the remote home directory
fn resolve_remote_dir(ctx: &mut StageContext<'_>) -> DeployResult<()> {
    let Some(rest) = ctx.remote_dir.strip_prefix("~/").map(str::to_string) else {
        return Ok(());
    };
    let printenv = RemoteCommand::new("printenv").arg("HOME");
    let out = ctx.run(printenv.clone())?;
    let home = out.lines().next().unwrap_or_default();

    if !home.is_empty() {
        ctx.remote_dir = remote_join(home, &rest);
    } else if ctx.options.dry_run {
        ctx.remote_dir = remote_join(DRY_RUN_HOME, &rest);
    } else {
        return Err(DeployError::Execution {
            command: printenv.render(),
            status: out.status,
            output: format!("remote HOME is empty; cannot resolve ~/{}", rest),
        });
    }
    Ok(())
}

fn clear_directory(dir: &str) -> RemoteCommand {
    // Hidden entries included; `.` and `..` are never matched at depth 1.
    RemoteCommand::new("find").args([
        dir, "-mindepth", "1", "-maxdepth", "1", "-exec", "rm", "-rf", "{}", "+",
    ])
}

fn upload_companions(ctx: &mut StageContext<'_>) -> DeployResult<()> {
    let config = ctx.config;
    let env_target = remote_join(&ctx.remote_dir, ".env");
    ctx.upload(&config.env_file, &env_target)?;

    let compose_target = remote_join(&ctx.remote_dir, &config.compose_file_name());
    ctx.upload(&config.compose_file, &compose_target)?;
    Ok(())
}

impl SourceStrategy for GitSync {
    fn name(&self) -> &'static str {
        "git"
    }

    fn sync(&self, ctx: &mut StageContext<'_>) -> DeployResult<()> {
        let dir = ctx.remote_dir.clone();
        let tracking = format!("origin/{}", self.branch);
        // A single-branch clone only tracks its first branch; name the
        // destination ref so a changed `branch` still gets `origin/<branch>`.
        let refspec = format!("+refs/heads/{}:refs/remotes/{}", self.branch, tracking);

        let git_dir = remote_join(&dir, ".git");

        ctx.run(RemoteCommand::new("mkdir").args(["-p", dir.as_str()]))?;
        let is_checkout = ctx
            .probe(RemoteCommand::new("test").args(["-d", git_dir.as_str()]))?
            .success();

        if !is_checkout {
            ctx.run(clear_directory(&dir))?;
            ctx.run(RemoteCommand::new("git").args([
                "clone",
                "--branch",
                self.branch.as_str(),
                "--single-branch",
                self.repo_url.as_str(),
                dir.as_str(),
            ]))?;
            return Ok(());
        }

        let git = || RemoteCommand::new("git").args(["-C", dir.as_str()]);
        ctx.run(git().args(["remote", "set-url", "origin", self.repo_url.as_str()]))?;
        ctx.run(git().args(["fetch", "--prune", "origin", refspec.as_str()]))?;
        ctx.run(git().args(["checkout", "-f", "-B", self.branch.as_str(), tracking.as_str()]))?;
        ctx.run(git().args(["reset", "--hard", tracking.as_str()]))?;
        ctx.run(git().args(["clean", "-ffdx"]))?;
        Ok(())
    }
}

impl SourceStrategy for ArchivePush {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn sync(&self, ctx: &mut StageContext<'_>) -> DeployResult<()> {
        let builder = ArchiveBuilder::new(&self.project_dir, &self.excludes)?;
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        let archive = builder.build(&format!("dockhand-{}-{}", ctx.config.service, stamp))?;
        info!(
            files = archive.file_count,
            bytes = archive.size,
            sha256 = %archive.sha256,
            "archive built"
        );

        let remote_archive = remote_join(
            &ctx.config.remote_tmp_dir,
            &format!(
                "dockhand-{}-{}-{}.tar.gz",
                ctx.config.service,
                stamp,
                &archive.sha256[..12]
            ),
        );

        ctx.artifacts.push(remote_archive.clone());
        ctx.upload(&archive.path, &remote_archive)?;

        if !ctx.options.dry_run {
            let out = ctx.run(RemoteCommand::new("sha256sum").arg(remote_archive.as_str()))?;
            let actual = out.output.split_whitespace().next().unwrap_or_default();
            if actual != archive.sha256 {
                return Err(DeployError::ChecksumMismatch {
                    path: remote_archive,
                    expected: archive.sha256.clone(),
                    actual: actual.to_string(),
                });
            }
        }

        let dir = ctx.remote_dir.clone();
        ctx.run(RemoteCommand::new("mkdir").args(["-p", dir.as_str()]))?;
        ctx.run(clear_directory(&dir))?;
        ctx.run(RemoteCommand::new("tar").args([
            "-xzf",
            remote_archive.as_str(),
            "-C",
            dir.as_str(),
        ]))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::deploy::DeployOptions;
    use crate::application::stages::testing::ScriptedSession;
    use crate::config::{from_entries, parse_entries, DeployConfig};
    use crate::domain::ports::{CommandOutput, NoopEventSink};
    use crate::domain::Stage;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn git_config(extra: &str) -> DeployConfig {
        let content = format!(
            "host=h\nuser=u\nssh_key=/k\nremote_dir=/srv/rolebot\nservice=rolebot\nrepo_url=git@example.com:org/rolebot.git\nbranch=master\n{}",
            extra
        );
        from_entries(&parse_entries(&content), Path::new("/cfg")).unwrap()
    }

    fn sync(session: &mut ScriptedSession, config: &DeployConfig) -> DeployResult<Vec<String>> {
        let options = DeployOptions::new();
        let mut ctx = StageContext::new(session, config, &options, &NoopEventSink);
        ctx.stage = Stage::Source;
        run(&mut ctx)?;
        Ok(ctx.commands)
    }

    #[test]
    fn fresh_host_clones() {
        let config = git_config("");
        let mut session =
            ScriptedSession::new().respond("test -d", CommandOutput::failed(1, ""));

        let commands = sync(&mut session, &config).unwrap();
        assert_eq!(commands[0], "mkdir -p /srv/rolebot");
        assert_eq!(commands[1], "test -d /srv/rolebot/.git");
        assert_eq!(
            commands[2],
            "find /srv/rolebot -mindepth 1 -maxdepth 1 -exec rm -rf '{}' +"
        );
        assert_eq!(
            commands[3],
            "git clone --branch master --single-branch git@example.com:org/rolebot.git /srv/rolebot"
        );
        assert!(!commands.iter().any(|c| c.contains("reset --hard")));
    }

    #[test]
    fn existing_checkout_is_hard_reset() {
        let config = git_config("");
        let mut session = ScriptedSession::new();

        let commands = sync(&mut session, &config).unwrap();
        let git: Vec<_> = commands.iter().filter(|c| c.starts_with("git")).collect();
        assert_eq!(
            git,
            [
                "git -C /srv/rolebot remote set-url origin git@example.com:org/rolebot.git",
                "git -C /srv/rolebot fetch --prune origin +refs/heads/master:refs/remotes/origin/master",
                "git -C /srv/rolebot checkout -f -B master origin/master",
                "git -C /srv/rolebot reset --hard origin/master",
                "git -C /srv/rolebot clean -ffdx",
            ]
        );
        assert!(!commands.iter().any(|c| c.contains("clone")));
    }

    #[test]
    fn companions_uploaded_after_sync() {
        let config = git_config("compose_file=deploy/compose.prod.yml\n");
        let mut session = ScriptedSession::new();

        let commands = sync(&mut session, &config).unwrap();
        let n = commands.len();
        assert_eq!(commands[n - 2], "upload /cfg/.env -> /srv/rolebot/.env");
        assert_eq!(
            commands[n - 1],
            "upload /cfg/deploy/compose.prod.yml -> /srv/rolebot/compose.prod.yml"
        );
    }

    #[test]
    fn home_relative_dir_is_resolved() {
        let config = git_config("remote_dir=~/apps/rolebot\n");
        let mut session =
            ScriptedSession::new().respond("printenv HOME", CommandOutput::ok("/home/deploy\n"));

        let commands = sync(&mut session, &config).unwrap();
        assert_eq!(commands[0], "printenv HOME");
        assert_eq!(commands[1], "mkdir -p /home/deploy/apps/rolebot");
    }

    #[test]
    fn empty_home_fails_instead_of_using_literal_tilde() {
        let config = git_config("remote_dir=~/apps/bot\n");
        let mut session = ScriptedSession::new().respond("printenv HOME", CommandOutput::ok("\n"));

        let err = sync(&mut session, &config).unwrap_err();
        assert!(
            matches!(err, DeployError::Execution { ref output, .. } if output.contains("HOME is empty"))
        );
        assert_eq!(session.log(), ["printenv HOME"]);
    }

    #[test]
    fn dry_run_marks_unresolved_home() {
        let config = git_config("remote_dir=~/apps/bot\n");
        let mut session = ScriptedSession::new().respond("printenv HOME", CommandOutput::ok(""));
        let options = DeployOptions::new().with_dry_run(true);
        let mut ctx = StageContext::new(&mut session, &config, &options, &NoopEventSink);
        run(&mut ctx).unwrap();

        assert_eq!(ctx.remote_dir, "<remote-home>/apps/bot");
        assert_eq!(ctx.commands[1], "mkdir -p '<remote-home>/apps/bot'");
        assert!(!ctx.commands.iter().any(|c| c.contains('~')));
    }

    #[test]
    fn failed_fetch_stops_the_stage() {
        let config = git_config("");
        let mut session = ScriptedSession::new()
            .respond("fetch", CommandOutput::failed(128, "fatal: couldn't find remote ref"));

        let err = sync(&mut session, &config).unwrap_err();
        assert!(matches!(err, DeployError::Execution { status: 128, .. }));
        assert!(session.position("reset --hard").is_none());
        assert!(session.position("upload").is_none());
    }

    fn archive_config(project: &Path) -> DeployConfig {
        let content = format!(
            "host=h\nuser=u\nssh_key=/k\nremote_dir=/srv/bot\nservice=bot\nproject_dir={}\nremote_tmp_dir=/var/tmp\n",
            project.display()
        );
        from_entries(&parse_entries(&content), Path::new("/cfg")).unwrap()
    }

    #[test]
    fn archive_push_verifies_and_extracts() {
        let project = tempdir().unwrap();
        fs::write(project.path().join("main.py"), "print(1)\n").unwrap();
        let config = archive_config(project.path());

        // Checksum is unknown until the archive exists; answer with a mismatch.
        let mut session =
            ScriptedSession::new().respond("sha256sum", CommandOutput::ok("deadbeef  /var/tmp/x\n"));
        let options = DeployOptions::new();
        let mut ctx = StageContext::new(&mut session, &config, &options, &NoopEventSink);
        let err = run(&mut ctx).unwrap_err();

        assert!(matches!(err, DeployError::ChecksumMismatch { ref actual, .. } if actual == "deadbeef"));
        assert_eq!(ctx.artifacts.len(), 1);
        assert!(ctx.artifacts[0].starts_with("/var/tmp/dockhand-bot-"));
        assert!(ctx.artifacts[0].ends_with(".tar.gz"));
        assert!(!ctx.commands.iter().any(|c| c.starts_with("tar ")));
    }

    #[test]
    fn archive_push_dry_run_skips_checksum() {
        let project = tempdir().unwrap();
        fs::write(project.path().join("main.py"), "print(1)\n").unwrap();
        let config = archive_config(project.path());

        let mut session = ScriptedSession::new();
        let options = DeployOptions::new().with_dry_run(true);
        let mut ctx = StageContext::new(&mut session, &config, &options, &NoopEventSink);
        run(&mut ctx).unwrap();

        let commands = &ctx.commands;
        assert!(!commands.iter().any(|c| c.starts_with("sha256sum")));
        let clear = commands.iter().position(|c| c.starts_with("find /srv/bot")).unwrap();
        let extract = commands.iter().position(|c| c.starts_with("tar -xzf")).unwrap();
        assert!(clear < extract);
        assert!(commands[extract].ends_with("-C /srv/bot"));
    }
}
