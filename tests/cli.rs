//! Smoke tests for the `semconf` binary.

use std::path::Path;
use std::process::Command;

fn semconf(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_semconf"))
        .args(args)
        .current_dir(dir)
        .env_remove("SEMCONF_FORMAT")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute semconf")
}

const CONFLICTING_REQUEST: &str = r#"{
  "task_changes": {
    "task-a": {
      "file_path": "app.py",
      "changes": [
        {"kind": "remove_import", "target": "Dict", "location": "import:Dict",
         "lines": {"start": 1, "end": 1}}
      ]
    },
    "task-b": {"file_path": "app.py", "changes": []}
  },
  "task_file_contents": {
    "task-b": {
      "before": "def foo():\n    return {}\n",
      "after": "def foo():\n    return {}\n\ndef process(data: Dict[str, int]) -> int:\n    return len(data)\n"
    }
  }
}"#;

fn write_request(dir: &Path, body: &str) {
    std::fs::write(dir.join("request.json"), body).unwrap();
}

#[test]
fn detect_reports_conflicts_as_text() {
    let dir = tempfile::tempdir().unwrap();
    write_request(dir.path(), CONFLICTING_REQUEST);

    let output = semconf(dir.path(), &["detect", "request.json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[Semantic: import_removal]"), "got: {stdout}");
    assert!(stdout.contains("1 semantic conflict(s)."), "got: {stdout}");
}

#[test]
fn detect_json_output_is_region_list() {
    let dir = tempfile::tempdir().unwrap();
    write_request(dir.path(), CONFLICTING_REQUEST);

    let output = semconf(dir.path(), &["detect", "request.json", "--format", "json"]);
    assert!(output.status.success());
    let regions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let regions = regions.as_array().unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0]["severity"], "critical");
    assert_eq!(regions[0]["can_auto_merge"], false);
    assert_eq!(regions[0]["merge_strategy"], "human_required");
    assert_eq!(regions[0]["tasks_involved"][0], "task-a");
}

#[test]
fn fail_on_conflict_sets_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    write_request(dir.path(), CONFLICTING_REQUEST);

    let output = semconf(dir.path(), &["detect", "request.json", "--fail-on-conflict"]);
    assert_eq!(output.status.code(), Some(1));

    write_request(dir.path(), r#"{"task_changes": {}, "task_file_contents": {}}"#);
    let output = semconf(dir.path(), &["detect", "request.json", "--fail-on-conflict"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "No semantic conflicts.\n");
}

#[test]
fn config_file_disables_detectors() {
    let dir = tempfile::tempdir().unwrap();
    write_request(dir.path(), CONFLICTING_REQUEST);
    std::fs::write(
        dir.path().join(".semconf.toml"),
        "[detect]\ndetectors = [\"function_rename\"]\n",
    )
    .unwrap();

    let output = semconf(dir.path(), &["detect", "request.json", "--fail-on-conflict"]);
    assert!(output.status.success());
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_request(dir.path(), CONFLICTING_REQUEST);
    std::fs::write(dir.path().join("custom.toml"), "[detect]\nbogus = true\n").unwrap();

    let output = semconf(
        dir.path(),
        &["detect", "request.json", "--config", "custom.toml"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("custom.toml"), "got: {stderr}");
    assert!(stderr.contains("bogus"), "got: {stderr}");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_request(dir.path(), CONFLICTING_REQUEST);
    let output = semconf(
        dir.path(),
        &["detect", "request.json", "--config", "nope.toml"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config file not found"));
}

#[test]
fn malformed_request_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_request(dir.path(), "{\"task_changes\": {\"bad id\": {}}}");
    let output = semconf(dir.path(), &["detect", "request.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid detection request"));
}

#[test]
fn symbols_prints_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("app.py"),
        "import os\n\ndef run() -> int | None:\n    return os.getpid()\n",
    )
    .unwrap();

    let output = semconf(dir.path(), &["symbols", "app.py"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run -> int | None"), "got: {stdout}");

    let output = semconf(dir.path(), &["symbols", "app.py", "--format", "json"]);
    assert!(output.status.success());
    let table: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(table["imports"]["os"], "os");
    assert_eq!(table["definitions"]["run"]["kind"], "function");
}

#[test]
fn symbols_reports_unavailable_analysis() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.py"), "def broken(:\n").unwrap();
    std::fs::write(dir.path().join("app.js"), "const x = 5;\n").unwrap();

    let output = semconf(dir.path(), &["symbols", "broken.py"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("syntax error"));

    let output = semconf(dir.path(), &["symbols", "app.js"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported file type"));
}
