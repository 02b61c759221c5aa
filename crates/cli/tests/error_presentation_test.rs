use std::{fs, process::Command};

use tempfile::tempdir;

fn run_saveql(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_saveql"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run saveql: {error}"))
}

#[cfg(feature = "sqlite")]
#[test]
fn connect_failure_keeps_typed_category_with_cli_context() {
    let tempdir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let db_path = tempdir
        .path()
        .join("missing-directory")
        .join("probe.db")
        .to_string_lossy()
        .into_owned();

    let output = run_saveql(&["sqlite", db_path.as_str(), "--scenario", "commit-only"]);

    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[data-access]"),
        "stderr must preserve the typed category, got: {stderr}",
    );
    assert!(
        stderr.contains("while running savepoint probe"),
        "stderr must include CLI context from anyhow::Context, got: {stderr}",
    );
    assert!(
        stderr.contains("CONNECT sqlite"),
        "stderr must retain the failing statement, got: {stderr}",
    );
}

#[cfg(feature = "sqlite")]
#[test]
fn missing_cases_file_reports_an_io_error() {
    let tempdir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let db_path = tempdir
        .path()
        .join("io.db")
        .to_string_lossy()
        .into_owned();
    let cases_path = tempdir
        .path()
        .join("no-such-cases.yaml")
        .to_string_lossy()
        .into_owned();

    let output = run_saveql(&["sqlite", db_path.as_str(), "--cases", cases_path.as_str()]);

    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[io]"),
        "stderr must carry the io category, got: {stderr}",
    );
    assert!(
        stderr.contains("while reading probe case file"),
        "stderr must include the file-read context, got: {stderr}",
    );
}

#[cfg(feature = "sqlite")]
#[test]
fn malformed_cases_file_reports_a_script_error() {
    let tempdir = tempdir().unwrap_or_else(|error| panic!("failed to create tempdir: {error}"));
    let db_path = tempdir
        .path()
        .join("script.db")
        .to_string_lossy()
        .into_owned();
    let cases_path = tempdir.path().join("broken.yaml");
    fs::write(&cases_path, "cases:\n  script: [unclosed")
        .unwrap_or_else(|error| panic!("failed to write cases file: {error}"));
    let cases_path = cases_path.to_string_lossy().into_owned();

    let output = run_saveql(&["sqlite", db_path.as_str(), "--cases", cases_path.as_str()]);

    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[script]"),
        "stderr must keep the script category for YAML faults, got: {stderr}",
    );
    assert!(
        stderr.contains("probe case definition is not valid YAML"),
        "stderr must retain the typed parse detail, got: {stderr}",
    );
}
