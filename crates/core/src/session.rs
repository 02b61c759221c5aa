use crate::{DatabaseAdapter, Result, ScriptError};

pub(crate) const COMMIT_SQL: &str = "COMMIT";
pub(crate) const ROLLBACK_SQL: &str = "ROLLBACK";

/// A savepoint as established by a probe session. `index` is the position in
/// the establishment order; whether the name is still valid later in the
/// session depends on the engine under probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savepoint {
    pub name: String,
    pub index: usize,
}

/// One explicit transaction against the probe target. Dropping an open
/// session rolls it back; `commit` consumes the session and keeps its writes.
///
/// The savepoint record is append-only: it lists every savepoint the session
/// established, not the set an engine still considers active after rollbacks
/// and releases. Observing that difference is what the probe is for.
pub struct Session<'a> {
    adapter: &'a dyn DatabaseAdapter,
    savepoints: Vec<Savepoint>,
    statements: Vec<String>,
    open: bool,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(adapter: &'a dyn DatabaseAdapter) -> Self {
        Self {
            adapter,
            savepoints: Vec::new(),
            statements: Vec::new(),
            open: true,
        }
    }

    pub fn execute(&mut self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "executing probe statement");
        self.adapter.execute(sql)?;
        self.statements.push(sql.to_string());
        Ok(())
    }

    pub fn savepoint(&mut self, name: &str) -> Result<Savepoint> {
        let sql = savepoint_sql(name)?;
        self.execute(&sql)?;
        let savepoint = Savepoint {
            name: name.to_string(),
            index: self.savepoints.len(),
        };
        self.savepoints.push(savepoint.clone());
        Ok(savepoint)
    }

    pub fn rollback_to(&mut self, name: &str) -> Result<()> {
        let sql = rollback_to_sql(name)?;
        self.execute(&sql)
    }

    /// Bare `ROLLBACK`: ends the whole transaction and with it every
    /// savepoint. The session stays usable, but statements issued afterwards
    /// run in whatever context the driver provides, and the commit epilogue
    /// becomes a no-op.
    pub fn rollback_all(&mut self) -> Result<()> {
        self.execute(ROLLBACK_SQL)?;
        self.open = false;
        Ok(())
    }

    pub fn release(&mut self, name: &str) -> Result<()> {
        let sql = release_sql(name)?;
        self.execute(&sql)
    }

    /// Re-enables driver auto-commit while the session's transaction is
    /// still open. Every driver under probe treats this as an implicit
    /// commit of the pending writes, so the session counts as finished.
    pub fn enable_auto_commit(&mut self) -> Result<()> {
        self.adapter.set_auto_commit(true)?;
        self.open = false;
        Ok(())
    }

    pub fn commit(mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.adapter.execute(COMMIT_SQL)?;
        self.open = false;
        Ok(())
    }

    #[must_use]
    pub fn savepoints(&self) -> &[Savepoint] {
        &self.savepoints
    }

    #[must_use]
    pub fn statement_log(&self) -> &[String] {
        &self.statements
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        tracing::debug!("rolling back unfinished probe session");
        let _ = self.adapter.execute(ROLLBACK_SQL);
    }
}

pub(crate) fn savepoint_sql(name: &str) -> Result<String> {
    ensure_valid_savepoint_name(name)?;
    Ok(format!("SAVEPOINT {name}"))
}

pub(crate) fn rollback_to_sql(name: &str) -> Result<String> {
    ensure_valid_savepoint_name(name)?;
    Ok(format!("ROLLBACK TO SAVEPOINT {name}"))
}

pub(crate) fn release_sql(name: &str) -> Result<String> {
    ensure_valid_savepoint_name(name)?;
    Ok(format!("RELEASE SAVEPOINT {name}"))
}

// Names are interpolated into SQL verbatim, so only plain identifiers are
// accepted: ASCII alphanumerics and underscores, not starting with a digit.
fn ensure_valid_savepoint_name(name: &str) -> Result<()> {
    let starts_valid = name
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    let all_valid = name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');

    if starts_valid && all_valid {
        return Ok(());
    }

    Err(ScriptError::InvalidSavepointName {
        name: name.to_string(),
    }
    .into())
}
