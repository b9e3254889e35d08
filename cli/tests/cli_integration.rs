use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cmdroute(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdroute"))
        .args(args)
        .env_remove("COMP_LINE")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cmdroute")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json(args: &[&str]) -> serde_json::Value {
    let manifest = fixture("shipit.yaml");
    let mut full = vec!["parse", "-m", manifest.to_str().unwrap(), "--"];
    full.extend_from_slice(args);

    let output = cmdroute(&full);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    serde_json::from_str(&stdout(&output)).expect("parse output should be JSON")
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_routes_interspersed_flags_to_multi_word_command() {
    let json = parse_json(&["server", "-p", "9000", "start", "--trace", "x"]);

    assert_eq!(json["command"], "server start");
    assert_eq!(json["flags"]["port"], 9000);
    assert_eq!(json["unknown"], serde_json::json!(["--trace", "x"]));
    assert_eq!(json["args"], serde_json::json!([]));
}

#[test]
fn parse_binds_positionals_and_rest() {
    let json = parse_json(&["deploy", "-e", "prod", "web", "-n", "worker"]);

    assert_eq!(json["command"], "deploy");
    assert_eq!(json["flags"]["env"], "prod");
    assert_eq!(json["flags"]["dry-run"], true);
    assert_eq!(json["positional"]["service"], "web");
    assert_eq!(json["rest"], serde_json::json!(["web", "worker"]));
    assert_eq!(json["args"], serde_json::json!(["web", "worker"]));
}

#[test]
fn parse_keeps_defaults_for_unset_flags() {
    let json = parse_json(&["deploy"]);
    assert_eq!(json["flags"]["env"], "staging");
    assert_eq!(json["flags"]["dry-run"], false);
}

#[test]
fn parse_yaml_output() {
    let manifest = fixture("shipit.yaml");
    let output = cmdroute(&[
        "parse",
        "-m",
        manifest.to_str().unwrap(),
        "-f",
        "yaml",
        "--",
        "server",
        "start",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("command: server start\n"), "{out}");
    assert!(out.contains("port: 8080"));
}

#[test]
fn parse_prints_command_help() {
    let manifest = fixture("shipit.yaml");
    let output = cmdroute(&["parse", "-m", manifest.to_str().unwrap(), "--", "deploy", "-e", "prod", "--help"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("Usage: shipit deploy [options] [arguments]\n"), "{out}");
    assert!(out.contains("Deploy a service"));
    assert!(out.contains("--env <value>"));
    assert!(!out.contains("\"command\""));
}

#[test]
fn parse_without_arguments_prints_general_help() {
    let manifest = fixture("shipit.yaml");
    let output = cmdroute(&["parse", "-m", manifest.to_str().unwrap()]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("Usage: shipit <command> [arguments]\n"));
    assert!(out.contains("Ship services to their environments"));
    assert!(out.contains("server start"));
}

#[test]
fn parse_reports_unknown_command() {
    let manifest = fixture("shipit.yaml");
    let output = cmdroute(&["parse", "-m", manifest.to_str().unwrap(), "--", "rollback", "now"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("error: unknown command: rollback now"));
}

#[test]
fn parse_reports_bad_flag_value() {
    let manifest = fixture("shipit.yaml");
    let output = cmdroute(&["parse", "-m", manifest.to_str().unwrap(), "--", "server", "start", "-p", "high"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("server start"), "{err}");
    assert!(err.contains("-p"), "{err}");
}

// ---------------------------------------------------------------------------
// describe / validate
// ---------------------------------------------------------------------------

#[test]
fn describe_prints_normalized_commands() {
    let manifest = fixture("shipit.yaml");
    let output = cmdroute(&["describe", "-m", manifest.to_str().unwrap(), "-f", "json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["name"], "shipit");
    assert_eq!(json["commands"][0]["path"], "deploy");
    assert_eq!(json["commands"][1]["path"], "server start");
    assert_eq!(json["commands"][1]["unknown"]["name"], "passthrough");
}

#[test]
fn validate_accepts_good_manifests() {
    let manifest = fixture("shipit.yaml");
    let output = cmdroute(&["validate", manifest.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Validated 1 manifest(s) declaring 2 command(s).\n");
}

#[test]
fn validate_rejects_duplicate_paths() {
    let manifest = fixture("duplicate.yaml");
    let output = cmdroute(&["validate", manifest.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("duplicate command path: deploy"));
}

#[test]
fn validate_reports_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");
    let output = cmdroute(&["validate", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load"));
}

#[test]
fn validate_reads_json_manifests() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tool.json");
    std::fs::write(
        &path,
        r#"{"name": "tool", "commands": [{"path": "run", "flags": [{"long": "fast"}]}]}"#,
    )
    .unwrap();

    let output = cmdroute(&["validate", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[test]
fn complete_command_words_and_flags() {
    let manifest = fixture("shipit.yaml");
    let m = manifest.to_str().unwrap();

    let output = cmdroute(&["complete", "-m", m, "--", "se"]);
    assert_eq!(stdout(&output), "server\n");

    let output = cmdroute(&["complete", "-m", m, "--", "server", ""]);
    assert_eq!(stdout(&output), "start\n");

    let output = cmdroute(&["complete", "-m", m, "--", "deploy", "--"]);
    assert_eq!(stdout(&output), "--dry-run\n--env\n");

    let output = cmdroute(&["complete", "-m", m, "--shell", "zsh", "--", "deploy", "-e"]);
    assert_eq!(stdout(&output), "-e:target environment\n");
}

#[test]
fn completion_scripts_name_the_manifest_program() {
    let manifest = fixture("shipit.yaml");
    let m = manifest.to_str().unwrap();

    let output = cmdroute(&["completion", "bash", "-m", m]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("complete -F _shipit_completion shipit"));

    let output = cmdroute(&["completion", "zsh", "-m", m]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("#compdef shipit\n"));
}
