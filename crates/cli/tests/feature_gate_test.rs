use std::process::Command;

fn run_saveql(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_saveql"))
        .args(args)
        .output()
        .unwrap_or_else(|err| panic!("failed to run saveql: {err}"))
}

#[test]
fn usage_lists_default_enabled_drivers() {
    let output = run_saveql(&[]);

    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: saveql <COMMAND>"));
    assert!(stderr.contains("mysql"));
    assert!(stderr.contains("postgres"));
    assert!(stderr.contains("sqlite"));
}

#[test]
fn rejects_subcommands_for_engines_without_a_driver() {
    let output = run_saveql(&["mssql"]);

    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand 'mssql'"));
    assert!(stderr.contains("Usage: saveql <COMMAND>"));
}
