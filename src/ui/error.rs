use crossterm::style::Stylize;

use dockhand::{ConfigError, DeployError};

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(deploy) = err.downcast_ref::<DeployError>() {
        return deploy.exit_code();
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    1
}

fn failed_stage(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<DeployError>()
        .and_then(DeployError::stage)
        .map(|s| s.name())
}

pub fn format_error(err: &anyhow::Error, color: bool) -> String {
    let label = if color {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    };
    format!("{} {}\n", label, err.to_string().trim_end())
}

/// GitHub Actions workflow command; newlines are escaped as `%0A`
fn github_actions_annotation(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error title=dockhand::{}", escaped)
}

pub fn print_error(err: &anyhow::Error, json: bool) {
    if json {
        let output = serde_json::json!({
            "event": "error",
            "message": err.to_string(),
            "stage": failed_stage(err),
            "exit_code": exit_code(err),
        });
        println!("{}", output);
        // stdout may be piped into a parser; operators still see the failure.
        eprint!("{}", format_error(err, false));
        return;
    }

    let caps = crate::ui::terminal::detect_capabilities();
    if caps.is_ci && std::env::var("GITHUB_ACTIONS").is_ok() {
        println!("{}", github_actions_annotation(&err.to_string()));
    }

    eprint!("{}", format_error(err, caps.supports_color));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand::Stage;

    #[test]
    fn exit_codes_follow_error_kind() {
        let config: anyhow::Error = ConfigError::missing("host").into();
        assert_eq!(exit_code(&config), 2);

        let stage: anyhow::Error = DeployError::Execution {
            command: "docker compose build".to_string(),
            status: 1,
            output: String::new(),
        }
        .in_stage(Stage::Build)
        .into();
        assert_eq!(exit_code(&stage), 4);
        assert_eq!(failed_stage(&stage), Some("build"));

        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn plain_format_names_stage_and_output() {
        let err: anyhow::Error = DeployError::Execution {
            command: "docker compose build rolebot".to_string(),
            status: 2,
            output: "no space left on device".to_string(),
        }
        .in_stage(Stage::Build)
        .into();
        let text = format_error(&err, false);
        assert!(text.starts_with("error: build stage failed"));
        assert!(text.contains("no space left on device"));
    }

    #[test]
    fn annotation_escapes_newlines() {
        assert_eq!(
            github_actions_annotation("a\nb 100%"),
            "::error title=dockhand::a%0Ab 100%25"
        );
    }
}
