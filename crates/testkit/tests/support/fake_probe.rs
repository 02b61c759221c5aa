use std::{cell::RefCell, error::Error as StdError, fmt, io};

use saveql_core::{
    ConnectionConfig, CustomerRow, DataAccessError, DatabaseAdapter, Dialect, Result, Session,
    Version,
};

pub const FAKE_CREATE_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS customer (id INTEGER PRIMARY KEY, name TEXT, email TEXT)";

pub struct FakeProbeDialect {
    name: &'static str,
}

impl FakeProbeDialect {
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for FakeProbeDialect {
    fn default() -> Self {
        Self::named("fakedb")
    }
}

impl Dialect for FakeProbeDialect {
    fn name(&self) -> &str {
        self.name
    }

    fn create_table_sql(&self) -> &str {
        FAKE_CREATE_TABLE_SQL
    }

    fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        Err(DataAccessError::statement_failed(
            0,
            "CONNECT fakedb",
            0,
            io::Error::other("fake dialect has no live connections"),
        )
        .into())
    }
}

#[derive(Debug)]
struct FailureRule {
    sql: String,
    message: String,
}

#[derive(Debug)]
pub struct FakeProbeAdapter {
    state: RefCell<FakeProbeState>,
}

#[derive(Debug)]
struct FakeProbeState {
    table_rows: Vec<CustomerRow>,
    server_version: Version,
    executed_sql: Vec<String>,
    fail_on_sql: Option<FailureRule>,
}

impl Default for FakeProbeAdapter {
    fn default() -> Self {
        Self {
            state: RefCell::new(FakeProbeState {
                table_rows: Vec::new(),
                server_version: Version {
                    major: 8,
                    minor: 0,
                    patch: 0,
                },
                executed_sql: Vec::new(),
                fail_on_sql: None,
            }),
        }
    }
}

#[allow(dead_code)]
impl FakeProbeAdapter {
    pub fn set_table_state(&self, rows: Vec<CustomerRow>) {
        self.state.borrow_mut().table_rows = rows;
    }

    pub fn set_server_version(&self, version: Version) {
        self.state.borrow_mut().server_version = version;
    }

    pub fn set_fail_on_sql(&self, sql: impl Into<String>, message: impl Into<String>) {
        self.state.borrow_mut().fail_on_sql = Some(FailureRule {
            sql: sql.into(),
            message: message.into(),
        });
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.state.borrow().executed_sql.clone()
    }
}

impl DatabaseAdapter for FakeProbeAdapter {
    fn execute(&self, sql: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();

        if let Some(rule) = &state.fail_on_sql
            && rule.sql == sql
        {
            return Err(DataAccessError::statement_failed(
                0,
                sql,
                0,
                FakeSourceError(rule.message.clone()),
            )
            .into());
        }

        state.executed_sql.push(sql.to_string());
        Ok(())
    }

    fn table_state(&self) -> Result<Vec<CustomerRow>> {
        Ok(self.state.borrow().table_rows.clone())
    }

    fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        let marker = if enabled {
            "SET autocommit=1"
        } else {
            "SET autocommit=0"
        };
        self.execute(marker)
    }

    fn begin_probe(&mut self) -> Result<Session<'_>> {
        self.set_auto_commit(false)?;
        Ok(Session::new(self))
    }

    fn server_version(&self) -> Result<Version> {
        Ok(self.state.borrow().server_version.clone())
    }
}

#[derive(Debug)]
struct FakeSourceError(String);

impl fmt::Display for FakeSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for FakeSourceError {}
