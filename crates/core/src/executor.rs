use crate::{
    DataAccessError, DatabaseAdapter, Error, ProbeReport, Result, Scenario, ScriptOp, Session,
    target,
};

pub const AUTO_COMMIT_SCENARIO: &str = "auto-commit-toggle";

/// Interprets probe scripts against one adapter. All script variants funnel
/// through `apply_op`, so every scenario exercises the same execution path.
pub struct Executor<'a> {
    adapter: &'a mut dyn DatabaseAdapter,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(adapter: &'a mut dyn DatabaseAdapter) -> Self {
        Self { adapter }
    }

    /// Runs one scenario in a fresh session: disable auto-commit, apply every
    /// script op in order, commit, then read back the surviving rows.
    /// Failures propagate immediately; the session's drop glue rolls the
    /// transaction back.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> Result<ProbeReport> {
        tracing::info!(scenario = %scenario.name, "running savepoint scenario");

        let mut session = self.adapter.begin_probe()?;
        for (index, op) in scenario.script.iter().enumerate() {
            if let Err(error) = apply_op(&mut session, op) {
                let executed = session.statement_log().len();
                return Err(at_script_position(error, index, executed));
            }
        }

        let savepoints = session.savepoints().to_vec();
        let statements = session.statement_log().to_vec();
        session.commit()?;

        let rows = self.adapter.table_state()?;
        tracing::debug!(
            scenario = %scenario.name,
            surviving_rows = rows.len(),
            "scenario committed"
        );

        Ok(ProbeReport {
            scenario: scenario.name.clone(),
            savepoints,
            statements,
            rows,
        })
    }

    /// Disables auto-commit, writes one row, then re-enables auto-commit.
    /// The surviving row shows that every driver under probe treats the
    /// re-enable as an implicit commit.
    pub fn auto_commit_toggle(&mut self, write_sql: &str) -> Result<ProbeReport> {
        tracing::info!("running auto-commit toggle probe");

        let mut session = self.adapter.begin_probe()?;
        if let Err(error) = session.execute(write_sql) {
            return Err(at_script_position(error, 0, 0));
        }
        session.enable_auto_commit()?;

        let savepoints = session.savepoints().to_vec();
        let statements = session.statement_log().to_vec();
        drop(session);

        let rows = self.adapter.table_state()?;
        Ok(ProbeReport {
            scenario: AUTO_COMMIT_SCENARIO.to_string(),
            savepoints,
            statements,
            rows,
        })
    }

    /// Clears the probe table outside any probe transaction. Autoincrement
    /// counters are deliberately left alone; id continuity across resets is
    /// one of the probe's observables.
    pub fn reset(&mut self) -> Result<()> {
        tracing::debug!("clearing probe table");
        self.adapter.execute(target::RESET_SQL)
    }

    pub fn ensure_table(&mut self, create_table_sql: &str) -> Result<()> {
        self.adapter.execute(create_table_sql)
    }
}

fn apply_op(session: &mut Session<'_>, op: &ScriptOp) -> Result<()> {
    match op {
        ScriptOp::Write(sql) => session.execute(sql),
        ScriptOp::Savepoint(name) => session.savepoint(name).map(|_| ()),
        ScriptOp::RollbackTo(name) => session.rollback_to(name),
        ScriptOp::RollbackAll => session.rollback_all(),
        ScriptOp::Release(name) => session.release(name),
    }
}

// Adapters report statement failures without knowing where in a script the
// statement sat; stamp the script position on before propagating.
fn at_script_position(error: Error, statement_index: usize, executed_statements: usize) -> Error {
    match error {
        Error::DataAccess(DataAccessError::StatementFailed { sql, source, .. }) => {
            DataAccessError::StatementFailed {
                statement_index,
                sql,
                executed_statements,
                source,
            }
            .into()
        }
        other => other,
    }
}
