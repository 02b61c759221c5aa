use std::collections::BTreeSet;

use saveql_core::{Scenario, ScriptOp, rendered_statements, scenarios};

#[test]
fn library_contains_nine_uniquely_named_scenarios() {
    let all = scenarios::all();
    assert_eq!(all.len(), 9);

    let names: BTreeSet<&str> = all.iter().map(|scenario| scenario.name.as_str()).collect();
    assert_eq!(names.len(), all.len());

    for scenario in &all {
        let found = scenarios::by_name(&scenario.name).expect("by_name finds library scenario");
        assert_eq!(&found, scenario);
    }

    assert!(scenarios::by_name("release-then-nothing").is_none());
}

#[test]
fn every_scenario_opens_with_the_staged_prologue() {
    let prologue = scenarios::commit_only().script;
    assert_eq!(prologue.len(), 7);

    for scenario in scenarios::all() {
        assert!(
            scenario.script.starts_with(&prologue),
            "scenario `{}` must start with the staged prologue",
            scenario.name,
        );
    }
}

#[test]
fn staged_prologue_renders_expected_statements() {
    let statements =
        rendered_statements(&scenarios::commit_only()).expect("library scripts render");

    assert_eq!(
        statements,
        vec![
            "INSERT INTO customer (name, email) VALUES ('Matt1', 'matt1@example.com')".to_string(),
            "SAVEPOINT s1".to_string(),
            "INSERT INTO customer (name, email) VALUES ('Matt2', 'matt2@example.com')".to_string(),
            "SAVEPOINT s2".to_string(),
            "INSERT INTO customer (name, email) VALUES ('Matt3', 'matt3@example.com')".to_string(),
            "SAVEPOINT s3".to_string(),
            "INSERT INTO customer (name, email) VALUES ('Matt4', 'matt4@example.com')".to_string(),
        ],
    );
}

#[test]
fn epilogues_target_the_expected_savepoints() {
    let epilogue = |scenario: Scenario| scenario.script[7..].to_vec();

    assert_eq!(
        epilogue(scenarios::rollback_to_middle()),
        vec![ScriptOp::RollbackTo("s2".to_string())],
    );
    assert_eq!(
        epilogue(scenarios::rollback_then_earlier()),
        vec![
            ScriptOp::RollbackTo("s2".to_string()),
            ScriptOp::RollbackTo("s1".to_string()),
        ],
    );
    assert_eq!(
        epilogue(scenarios::rollback_then_later()),
        vec![
            ScriptOp::RollbackTo("s2".to_string()),
            ScriptOp::RollbackTo("s3".to_string()),
        ],
    );
    assert_eq!(
        epilogue(scenarios::rollback_twice_same()),
        vec![
            ScriptOp::RollbackTo("s2".to_string()),
            ScriptOp::RollbackTo("s2".to_string()),
        ],
    );
    assert_eq!(
        epilogue(scenarios::rollback_all_then_savepoint()),
        vec![ScriptOp::RollbackAll, ScriptOp::RollbackTo("s2".to_string())],
    );
    assert_eq!(
        epilogue(scenarios::release_then_earlier()),
        vec![
            ScriptOp::Release("s2".to_string()),
            ScriptOp::RollbackTo("s1".to_string()),
        ],
    );
    assert_eq!(
        epilogue(scenarios::release_then_later()),
        vec![
            ScriptOp::Release("s2".to_string()),
            ScriptOp::RollbackTo("s3".to_string()),
        ],
    );
    assert_eq!(
        epilogue(scenarios::release_then_same()),
        vec![
            ScriptOp::Release("s2".to_string()),
            ScriptOp::RollbackTo("s2".to_string()),
        ],
    );
}

#[test]
fn rendered_statements_rejects_malformed_savepoint_names() {
    let scenario = Scenario::new(
        "injection-attempt",
        vec![ScriptOp::Savepoint("s1; DROP TABLE customer".to_string())],
    );

    let error = rendered_statements(&scenario).expect_err("malformed name must not render");
    assert!(matches!(
        error,
        saveql_core::Error::Script(saveql_core::ScriptError::InvalidSavepointName { .. })
    ));
}

#[test]
fn write_literals_escape_single_quotes() {
    let sql = saveql_core::insert_customer_sql("O'Brien", "ob@example.com");
    assert_eq!(
        sql,
        "INSERT INTO customer (name, email) VALUES ('O''Brien', 'ob@example.com')",
    );
}
