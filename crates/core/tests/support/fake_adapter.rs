use std::{cell::RefCell, error::Error as StdError, fmt};

use saveql_core::{CustomerRow, DataAccessError, DatabaseAdapter, Result, Session, Version};

pub const COMMIT_SQL: &str = "COMMIT";
pub const ROLLBACK_SQL: &str = "ROLLBACK";
pub const AUTO_COMMIT_OFF_SQL: &str = "SET autocommit=0";
pub const AUTO_COMMIT_ON_SQL: &str = "SET autocommit=1";

#[derive(Debug)]
struct FailureRule {
    sql: String,
    message: String,
}

#[derive(Debug)]
pub struct FakeAdapter {
    state: RefCell<FakeAdapterState>,
}

#[derive(Debug)]
struct FakeAdapterState {
    table_rows: Vec<CustomerRow>,
    server_version: Version,
    executed_sql: Vec<String>,
    commit_count: usize,
    rollback_count: usize,
    fail_on_sql: Option<FailureRule>,
}

impl Default for FakeAdapterState {
    fn default() -> Self {
        Self {
            table_rows: Vec::new(),
            server_version: Version {
                major: 0,
                minor: 0,
                patch: 0,
            },
            executed_sql: Vec::new(),
            commit_count: 0,
            rollback_count: 0,
            fail_on_sql: None,
        }
    }
}

impl Default for FakeAdapter {
    fn default() -> Self {
        Self {
            state: RefCell::new(FakeAdapterState::default()),
        }
    }
}

#[allow(dead_code)]
impl FakeAdapter {
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

    pub fn clear_fail_on_sql(&self) {
        self.state.borrow_mut().fail_on_sql = None;
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.state.borrow().executed_sql.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.state.borrow().commit_count
    }

    pub fn rollback_count(&self) -> usize {
        self.state.borrow().rollback_count
    }
}

impl DatabaseAdapter for FakeAdapter {
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
        match sql {
            COMMIT_SQL => state.commit_count += 1,
            ROLLBACK_SQL => state.rollback_count += 1,
            _ => {}
        }

        Ok(())
    }

    fn table_state(&self) -> Result<Vec<CustomerRow>> {
        Ok(self.state.borrow().table_rows.clone())
    }

    fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        let marker = if enabled {
            AUTO_COMMIT_ON_SQL
        } else {
            AUTO_COMMIT_OFF_SQL
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
