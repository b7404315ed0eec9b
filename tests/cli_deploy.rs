mod common;

use common::TestEnv;
use serde_json::Value;

fn events(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_dry_run_reports_every_stage() {
    let env = TestEnv::new();

    let result = env.run(&["deploy", "--dry-run"]);

    assert!(result.success, "{}", result.combined_output());
    assert!(result.stdout.contains("Dry Run Complete"));
    assert!(result
        .stdout
        .contains("source -> build -> migrate -> cutover -> cleanup"));
    assert!(result.stderr.contains("Deploying rolebot to deploy@10.0.0.5 (dry run)"));
}

#[test]
fn test_dry_run_json_event_stream() {
    let env = TestEnv::new();

    let result = env.run(&["deploy", "--dry-run", "--json"]);

    assert!(result.success, "{}", result.combined_output());
    let events = events(&result.stdout);

    assert_eq!(events[0]["event"], "start");
    assert_eq!(events[0]["dry_run"], true);
    assert_eq!(events[1]["event"], "connected");

    let stages: Vec<&str> = events
        .iter()
        .filter(|e| e["event"] == "stage_complete")
        .map(|e| e["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, ["source", "build", "migrate", "cutover", "cleanup"]);

    assert!(events
        .iter()
        .any(|e| e["event"] == "command" && e["command"] == "docker image prune -f"));

    let n = events.len();
    assert_eq!(events[n - 2]["event"], "complete");
    assert_eq!(events[n - 1]["event"], "report");
}

#[test]
fn test_missing_local_file_fails_before_connecting() {
    let env = TestEnv::new();
    env.remove("id_ed25519");

    let result = env.run(&["deploy", "--yes", "--json"]);

    assert_eq!(result.exit_code, 2);
    let events = events(&result.stdout);
    assert!(events.iter().all(|e| e["event"] != "start"));
    assert_eq!(events.last().unwrap()["event"], "error");
}

#[test]
fn test_local_deploy_failure_names_stage() {
    // The source stage fails: the repository URL does not exist.
    let env = TestEnv::new();
    let remote = env.path("remote");
    env.write(
        "deploy.conf",
        &format!(
            "host=localhost\nuser=me\nssh_key=id_ed25519\nremote_dir={}\nservice=rolebot\nrepo_url={}\nbranch=main\n",
            remote.display(),
            env.path("no-such-repo").display()
        ),
    );

    let result = env.run(&["deploy", "--local", "--yes", "--json"]);

    assert_eq!(result.exit_code, 4, "{}", result.combined_output());
    let events = events(&result.stdout);
    assert!(events
        .iter()
        .any(|e| e["event"] == "stage_failed" && e["stage"] == "source"));
    let error = events.last().unwrap();
    assert_eq!(error["event"], "error");
    assert_eq!(error["stage"], "source");
}
