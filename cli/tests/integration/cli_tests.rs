//! CLI structure, argument parsing and the version command.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

pub fn cnctl() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cnctl"));
    cmd.env("NO_COLOR", "1").env_remove("CNCTL_INVENTORY");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    cnctl().assert().code(2).stderr(predicate::str::contains(
        "Run shell commands and tasks against local and remote agents",
    ));
}

#[test]
fn test_cli_help_lists_commands() {
    cnctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("shell"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_version_command_shows_version() {
    cnctl()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "cnctl {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = cnctl()
        .args(["version", "--json"])
        .output()
        .expect("run cnctl");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_subcommand_fails() {
    cnctl().arg("frobnicate").assert().code(2);
}

#[test]
fn test_shell_requires_a_command() {
    cnctl().args(["shell", "local"]).assert().code(2);
}
