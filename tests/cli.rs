//! CLI surface tests via the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn scmpromote() -> Command {
    Command::cargo_bin("scmpromote").unwrap()
}

#[test]
fn no_arguments_shows_usage() {
    scmpromote()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
    scmpromote()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("scmpromote"));
}

#[test]
fn status_outside_a_repository_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    scmpromote()
        .args(["--no-color", "-C", temp.path().to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No SCM repository found"));
}

#[test]
fn unknown_scm_type_is_rejected() {
    scmpromote()
        .args(["--no-color", "--scm", "svn", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported SCM type"));
}

#[test]
fn status_with_dummy_backend() {
    scmpromote()
        .args(["--no-color", "-C", ".", "--scm", "dummy", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mod dummy.txt"));
}

#[test]
fn status_json_output() {
    scmpromote()
        .args([
            "--no-color",
            "-C",
            ".",
            "--scm",
            "dummy",
            "status",
            "--output",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""state": "mod""#));
}

#[test]
fn promote_with_dummy_backend_reports_commit() {
    scmpromote()
        .args([
            "--no-color",
            "-C",
            ".",
            "--scm",
            "dummy",
            "promote",
            "integration",
            "-m",
            "promote model updates",
            "--run",
            "true",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("dummy1"));
}

#[test]
fn promote_with_failing_handler_fails() {
    scmpromote()
        .args([
            "--no-color",
            "-C",
            ".",
            "--scm",
            "dummy",
            "promote",
            "integration",
            "-m",
            "promote model updates",
            "--run",
            "exit 9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
