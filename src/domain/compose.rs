//! Container runtime control surface
//!
//! Produces the compose commands the pipeline issues. Nothing here runs a
//! command; stages hand the results to a [`RemoteSession`].
//!
//! [`RemoteSession`]: crate::domain::ports::RemoteSession

use super::command::RemoteCommand;

/// Compose invocation bound to one project directory and compose file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRuntime {
    program: String,
    base_args: Vec<String>,
    compose_file: String,
    project_dir: String,
}

impl ComposeRuntime {
    /// `compose_command` is the launcher as typed by the operator,
    /// e.g. `docker compose` or `docker-compose`.
    pub fn new(compose_command: &str, compose_file: &str, project_dir: &str) -> Self {
        let mut words = compose_command.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_else(|| "docker".to_string());
        Self {
            program,
            base_args: words.collect(),
            compose_file: compose_file.to_string(),
            project_dir: project_dir.to_string(),
        }
    }

    fn compose(&self) -> RemoteCommand {
        RemoteCommand::new(&self.program)
            .args(self.base_args.iter().cloned())
            .args(["-f", self.compose_file.as_str()])
            .current_dir(&self.project_dir)
    }

    /// Engine CLI matching the compose launcher (`docker-compose` -> `docker`)
    pub fn engine(&self) -> &str {
        self.program
            .strip_suffix("-compose")
            .unwrap_or(self.program.as_str())
    }

    pub fn build(&self, services: &[&str], no_cache: bool) -> RemoteCommand {
        let mut cmd = self.compose().arg("build");
        if no_cache {
            cmd = cmd.arg("--no-cache");
        }
        cmd.args(services.iter().copied())
    }

    /// Declarative "converge to this set of services"
    ///
    /// Idempotent: services already matching their definition are left alone.
    pub fn converge(&self, services: &[&str]) -> RemoteCommand {
        self.compose()
            .args(["up", "-d", "--remove-orphans"])
            .args(services.iter().copied())
    }

    /// Short-lived container that runs `command` and is removed afterwards
    pub fn run_one_shot(
        &self,
        service: &str,
        workdir: &str,
        mounts: &[(String, String)],
        command: &[String],
    ) -> RemoteCommand {
        let mut cmd = self.compose().args(["run", "--rm", "--no-deps"]);
        for (host, container) in mounts {
            cmd = cmd.arg("-v").arg(format!("{}:{}", host, container));
        }
        cmd.args(["-w", workdir])
            .arg(service)
            .args(command.iter().cloned())
    }

    pub fn list_running_services(&self) -> RemoteCommand {
        self.compose()
            .args(["ps", "--services", "--filter", "status=running"])
    }

    /// Garbage-collect dangling images
    pub fn prune_images(&self) -> RemoteCommand {
        RemoteCommand::new(self.engine()).args(["image", "prune", "-f"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> ComposeRuntime {
        ComposeRuntime::new("docker compose", "docker-compose.yml", "/srv/bot")
    }

    #[test]
    fn build_without_cache_flag() {
        let cmd = runtime().build(&["rolebot"], false);
        assert_eq!(
            cmd.render(),
            "cd /srv/bot && docker compose -f docker-compose.yml build rolebot"
        );
    }

    #[test]
    fn build_with_no_cache() {
        let cmd = runtime().build(&["rolebot"], true);
        assert!(cmd.render().ends_with("build --no-cache rolebot"));
    }

    #[test]
    fn converge_is_declarative() {
        let rendered = runtime().converge(&["rolebot"]).render();
        assert!(rendered.ends_with("up -d --remove-orphans rolebot"));
        assert!(!rendered.contains(" stop"));
        assert!(!rendered.contains(" rm "));
    }

    #[test]
    fn one_shot_mounts_source_and_sets_workdir() {
        let cmd = runtime().run_one_shot(
            "rolebot",
            "/app/honor_system",
            &[("/srv/bot".to_string(), "/app".to_string())],
            &["alembic".to_string(), "upgrade".to_string(), "head".to_string()],
        );
        assert_eq!(
            cmd.render(),
            "cd /srv/bot && docker compose -f docker-compose.yml run --rm --no-deps \
             -v /srv/bot:/app -w /app/honor_system rolebot alembic upgrade head"
        );
    }

    #[test]
    fn legacy_launcher_maps_to_engine() {
        let rt = ComposeRuntime::new("docker-compose", "compose.yml", "/srv/bot");
        assert_eq!(rt.engine(), "docker");
        assert_eq!(rt.prune_images().render(), "docker image prune -f");
        assert!(rt
            .list_running_services()
            .render()
            .starts_with("cd /srv/bot && docker-compose -f compose.yml ps"));
    }

    #[test]
    fn podman_launcher_maps_to_podman() {
        let rt = ComposeRuntime::new("podman-compose", "compose.yml", "/srv/bot");
        assert_eq!(rt.engine(), "podman");
    }
}
