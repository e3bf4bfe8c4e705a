//! `shell` and `run` executing real local sessions.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::cli_tests::cnctl;
use crate::inventory_commands::write_inventory;

const INVENTORY: &str = r"
agents:
  - name: box
    desc: a box
    start_path: /tmp
groups:
  - name: pair
    members: [local, box]
tasks:
  - name: prepare
    commands: ['echo preparing <(name)>']
  - name: build
    depends: [prepare]
    commands: ['cd <(startPath)> && pwd']
  - name: broken
    commands: ['exit 7']
";

#[test]
fn test_shell_prints_tag_protocol() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["shell", "-i"])
        .arg(&path)
        .args(["box", "echo", "hello", "<(name)>"])
        .assert()
        .success()
        .stdout(predicate::str::contains("box      >>> echo hello box\n"))
        .stdout(predicate::str::contains("box      <<< hello box\n"))
        .stdout(predicate::str::contains("box      ??? 0\n"));
}

#[test]
fn test_shell_exit_code_propagates() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["shell", "-i"])
        .arg(&path)
        .args(["box", "exit 3"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("box      ??? 3"));
}

#[test]
fn test_shell_reports_stderr_on_error_channel() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["shell", "-i"])
        .arg(&path)
        .args(["local", "echo oops >&2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local    !!! oops"));
}

#[test]
fn test_shell_on_group_reaches_every_member() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["shell", "-i"])
        .arg(&path)
        .args(["pair", "echo", "<(name)>"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local    <<< local"))
        .stdout(predicate::str::contains("box      <<< box"))
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn test_quiet_hides_command_and_output_channels() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["shell", "--quiet", "-i"])
        .arg(&path)
        .args(["box", "echo", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains(">>>").not())
        .stdout(predicate::str::contains("secret").not())
        .stdout(predicate::str::contains("box      ??? 0"));
}

#[test]
fn test_dry_run_logs_but_does_not_execute() {
    let (_dir, path) = write_inventory(INVENTORY);
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("touched");
    cnctl()
        .args(["shell", "--dry-run", "-i"])
        .arg(&path)
        .args(["box", "touch"])
        .arg(&marker)
        .assert()
        .success()
        .stdout(predicate::str::contains("box      >>> touch"))
        .stdout(predicate::str::contains("<<<").not());
    assert!(!marker.exists());
}

#[test]
fn test_shell_json_returns_reports() {
    let (_dir, path) = write_inventory(INVENTORY);
    let output = cnctl()
        .args(["shell", "--json", "-i"])
        .arg(&path)
        .args(["box", "echo", "hi"])
        .output()
        .expect("run cnctl");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(v[0]["agent"], "box");
    assert_eq!(v[0]["stdout"], serde_json::json!(["hi"]));
    assert_eq!(v[0]["exit_code"], 0);
}

#[test]
fn test_unknown_target_fails_with_json_error() {
    let (_dir, path) = write_inventory(INVENTORY);
    let output = cnctl()
        .args(["shell", "--json", "-i"])
        .arg(&path)
        .args(["nowhere", "true"])
        .output()
        .expect("run cnctl");
    assert!(!output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(v["error"], true);
    assert_eq!(v["code"], "NOT_FOUND");
}

#[test]
fn test_timeout_kills_hung_session() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["shell", "--timeout", "1", "-i"])
        .arg(&path)
        .args(["box", "sleep 20"])
        .timeout(std::time::Duration::from_secs(15))
        .assert()
        .failure()
        .stderr(predicate::str::contains("deadline"));
}

#[test]
fn test_run_executes_dependencies_first() {
    let (_dir, path) = write_inventory(INVENTORY);
    let output = cnctl()
        .args(["run", "-i"])
        .arg(&path)
        .args(["build", "box"])
        .output()
        .expect("run cnctl");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let preparing = stdout.find("box      <<< preparing box").expect("prepare output");
    let built = stdout.find("box      <<< /tmp").expect("build output");
    assert!(preparing < built, "unexpected order:\n{stdout}");
}

#[test]
fn test_run_defaults_to_local_agent() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["run", "-i"])
        .arg(&path)
        .arg("prepare")
        .assert()
        .success()
        .stdout(predicate::str::contains("local    <<< preparing local"));
}

#[test]
fn test_run_failing_task_sets_exit_code() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["run", "-i"])
        .arg(&path)
        .args(["broken", "box"])
        .assert()
        .code(7);
}

#[test]
fn test_run_unknown_task_fails() {
    let (_dir, path) = write_inventory(INVENTORY);
    cnctl()
        .args(["run", "-i"])
        .arg(&path)
        .args(["nope", "box"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("task 'nope' is not registered"));
}
