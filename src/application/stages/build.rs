//! Build stage

use tracing::info;

use super::StageContext;
use crate::domain::StageOutcome;
use crate::error::DeployResult;

pub(super) fn run(ctx: &mut StageContext<'_>) -> DeployResult<StageOutcome> {
    let service = ctx.config.service.clone();
    info!(service = %service, no_cache = ctx.options.no_cache, "building image");
    let command = ctx.compose().build(&[service.as_str()], ctx.options.no_cache);
    ctx.run(command)?;
    Ok(StageOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::deploy::DeployOptions;
    use crate::application::stages::testing::ScriptedSession;
    use crate::config::{from_entries, parse_entries};
    use crate::domain::ports::{CommandOutput, NoopEventSink};
    use crate::error::DeployError;
    use std::path::Path;

    fn commands(options: DeployOptions, session: &mut ScriptedSession) -> DeployResult<Vec<String>> {
        let config = from_entries(
            &parse_entries(
                "host=h\nuser=u\nssh_key=/k\nremote_dir=/srv/rolebot\nservice=rolebot\nrepo_url=R\nbranch=master\n",
            ),
            Path::new("/"),
        )
        .unwrap();
        let mut ctx = StageContext::new(session, &config, &options, &NoopEventSink);
        run(&mut ctx)?;
        Ok(ctx.commands)
    }

    #[test]
    fn builds_only_the_service() {
        let cmds = commands(DeployOptions::new(), &mut ScriptedSession::new()).unwrap();
        assert_eq!(
            cmds,
            ["cd /srv/rolebot && docker compose -f docker-compose.yml build rolebot"]
        );
    }

    #[test]
    fn no_cache_flag_reaches_the_build() {
        let cmds = commands(
            DeployOptions::new().with_no_cache(true),
            &mut ScriptedSession::new(),
        )
        .unwrap();
        assert!(cmds[0].ends_with("build --no-cache rolebot"));
    }

    #[test]
    fn build_failure_carries_output() {
        let mut session = ScriptedSession::new()
            .respond("build", CommandOutput::failed(17, "failed to solve: pip install"));
        let err = commands(DeployOptions::new(), &mut session).unwrap_err();
        match err {
            DeployError::Execution { status, output, .. } => {
                assert_eq!(status, 17);
                assert!(output.contains("pip install"));
            }
            other => panic!("unexpected: {other}"),
        }
    }
}
