use std::collections::BTreeMap;

use saveql_core::{ConnectionConfig, DataAccessError, Dialect, Error};
use saveql_driver_mysql::MysqlDialect;

fn sample_connection() -> ConnectionConfig {
    ConnectionConfig {
        host: Some("127.0.0.1".to_string()),
        port: Some(3306),
        user: Some("root".to_string()),
        password: None,
        database: "saveql".to_string(),
        socket: None,
        extra: BTreeMap::new(),
    }
}

fn connect_failure_message(config: &ConnectionConfig) -> String {
    let error = match MysqlDialect.connect(config) {
        Ok(_) => panic!("connect should have been rejected"),
        Err(error) => error,
    };
    match error {
        Error::DataAccess(DataAccessError::StatementFailed { source, .. }) => source.to_string(),
        other => panic!("expected a data access error, got: {other:?}"),
    }
}

#[test]
fn dialect_reports_name_and_bootstrap_ddl() {
    let dialect = MysqlDialect;
    assert_eq!(dialect.name(), "mysql");

    let ddl = dialect.create_table_sql();
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS customer"));
    assert!(ddl.contains("AUTO_INCREMENT"));
    assert!(
        ddl.contains("ENGINE=InnoDB"),
        "savepoints need a transactional storage engine"
    );
}

#[test]
fn connect_rejects_mysql_versions_below_5_0_3() {
    let mut connection = sample_connection();
    connection
        .extra
        .insert("mysql.server_version".to_string(), "4.1.22".to_string());

    let message = connect_failure_message(&connection);
    assert!(
        message.contains("savepoint release requires 5.0.3+"),
        "expected minimum-version rejection, got: {message}"
    );
}

#[test]
fn version_floor_sees_through_build_suffixes() {
    let mut connection = sample_connection();
    connection
        .extra
        .insert("mysql.server_version".to_string(), "4.1.22-log".to_string());

    let message = connect_failure_message(&connection);
    assert!(
        message.contains("savepoint release requires 5.0.3+"),
        "suffixed versions must still hit the floor, got: {message}"
    );
}

#[test]
fn connect_rejects_unparseable_version_overrides() {
    let mut connection = sample_connection();
    connection
        .extra
        .insert("mysql.server_version".to_string(), "beta".to_string());

    let message = connect_failure_message(&connection);
    assert!(
        message.contains("failed to parse mysql server version string"),
        "expected parse failure, got: {message}"
    );
}
