use crate::{Result, session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOp {
    Write(String),
    Savepoint(String),
    RollbackTo(String),
    RollbackAll,
    Release(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub script: Vec<ScriptOp>,
}

impl Scenario {
    #[must_use]
    pub fn new(name: impl Into<String>, script: Vec<ScriptOp>) -> Self {
        Self {
            name: name.into(),
            script,
        }
    }
}

/// The exact statements a session would issue for this script, in order,
/// without touching a database. The commit epilogue is not part of the
/// script and is not included.
pub fn rendered_statements(scenario: &Scenario) -> Result<Vec<String>> {
    scenario
        .script
        .iter()
        .map(|op| match op {
            ScriptOp::Write(sql) => Ok(sql.clone()),
            ScriptOp::Savepoint(name) => session::savepoint_sql(name),
            ScriptOp::RollbackTo(name) => session::rollback_to_sql(name),
            ScriptOp::RollbackAll => Ok(session::ROLLBACK_SQL.to_string()),
            ScriptOp::Release(name) => session::release_sql(name),
        })
        .collect()
}
