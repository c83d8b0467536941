use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile, TempDir};

/// Creates a mock-only config whose state directories live under `dir`.
fn create_mock_config(dir: &TempDir) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    let base = dir.path().display();
    write(
        config.path(),
        format!(
            r#"
logging:
  log_file: {base}/logs/api_call_log.jsonl
storage_service:
  provider: MockS3
  mock_s3:
    base_path: {base}/mock_s3
    default_bucket: demo-bucket
email_service:
  provider: MockOutbox
  mock_outbox:
    outbox_dir: {base}/outbox
signature_service:
  provider: MockDocuSign
  mock_docusign:
    output_dir: {base}/signatures
    auto_complete_after_minutes: -1
search_service:
  provider: MockGoogle
"#
        ),
    )
    .expect("Writing temp config failed");
    config
}

#[test]
fn demo_happy_flow_succeeds_against_mocks() {
    let state = tempdir().expect("tempdir");
    let config = create_mock_config(&state);

    let mut cmd = Command::cargo_bin("switchboard").expect("Binary exists");
    cmd.arg("demo").arg("--config").arg(config.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Demo complete"))
        .stdout(predicate::str::contains("Passed"));

    // The run leaves an auditable call log behind.
    let log = state.path().join("logs/api_call_log.jsonl");
    let contents = std::fs::read_to_string(log).expect("call log exists");
    assert!(contents.lines().count() >= 4, "one record per service call");
}

#[test]
fn search_command_prints_ranked_results() {
    let state = tempdir().expect("tempdir");
    let config = create_mock_config(&state);

    let mut cmd = Command::cargo_bin("switchboard").expect("Binary exists");
    cmd.arg("search")
        .arg("--config")
        .arg(config.path())
        .arg("--query")
        .arg("rust traits")
        .arg("--num-results")
        .arg("3");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1. Result 1: rust traits"));
}

#[test]
fn unknown_provider_exits_nonzero() {
    let state = tempdir().expect("tempdir");
    let config = NamedTempFile::new().expect("temp config");
    write(
        config.path(),
        format!(
            "logging:\n  log_file: {}/logs/calls.jsonl\nstorage_service:\n  provider: AWSS3\n",
            state.path().display()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("switchboard").expect("Binary exists");
    cmd.arg("demo").arg("--config").arg(config.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown storage_service provider"));
}

#[test]
fn missing_config_file_exits_nonzero() {
    let mut cmd = Command::cargo_bin("switchboard").expect("Binary exists");
    cmd.arg("demo").arg("--config").arg("./does/not/exist.yaml");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("read config file"));
}
