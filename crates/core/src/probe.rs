use crate::{
    ConnectionConfig, CustomerRow, DatabaseAdapter, Dialect, Executor, Result, Savepoint, Scenario,
    target,
};

/// What one scenario run observed: the savepoints the session established,
/// the statements it issued, and the rows left in the probe table afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub scenario: String,
    pub savepoints: Vec<Savepoint>,
    pub statements: Vec<String>,
    pub rows: Vec<CustomerRow>,
}

impl ProbeReport {
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.name.clone()).collect()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<i64> {
        self.rows.iter().map(|row| row.id).collect()
    }
}

/// One matrix slot: a scenario either produced a report or an error, and the
/// error is as much a finding as the report is.
#[derive(Debug)]
pub struct MatrixEntry {
    pub scenario: String,
    pub outcome: Result<ProbeReport>,
}

/// Entry point for probing one engine: connects through the dialect, makes
/// sure the probe table exists, and hands scenarios to an `Executor`.
pub struct SavepointProbe<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> SavepointProbe<'a> {
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Runs one scenario on its own connection and propagates any failure to
    /// the caller. The connection is dropped afterwards either way.
    pub fn run_scenario(
        &self,
        config: &ConnectionConfig,
        scenario: &Scenario,
    ) -> Result<ProbeReport> {
        let mut adapter = self.connect(config)?;
        let mut executor = Executor::new(adapter.as_mut());
        executor.ensure_table(self.dialect.create_table_sql())?;
        executor.run_scenario(scenario)
    }

    /// Runs several scenarios over one connection with a table reset between
    /// them. Scenario failures land in the matrix entries instead of
    /// aborting the run; only infrastructure failures (connect, reset)
    /// propagate.
    pub fn run_matrix(
        &self,
        config: &ConnectionConfig,
        scenarios: &[Scenario],
    ) -> Result<Vec<MatrixEntry>> {
        let mut adapter = self.connect(config)?;
        let mut executor = Executor::new(adapter.as_mut());
        executor.ensure_table(self.dialect.create_table_sql())?;

        let mut entries = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            executor.reset()?;
            entries.push(MatrixEntry {
                scenario: scenario.name.clone(),
                outcome: executor.run_scenario(scenario),
            });
        }

        Ok(entries)
    }

    pub fn auto_commit_toggle(&self, config: &ConnectionConfig) -> Result<ProbeReport> {
        let mut adapter = self.connect(config)?;
        let mut executor = Executor::new(adapter.as_mut());
        executor.ensure_table(self.dialect.create_table_sql())?;
        executor.auto_commit_toggle(&target::insert_customer_sql("Matt5", "matt5@example.com"))
    }

    pub fn reset_state(&self, config: &ConnectionConfig) -> Result<()> {
        let mut adapter = self.connect(config)?;
        let mut executor = Executor::new(adapter.as_mut());
        executor.ensure_table(self.dialect.create_table_sql())?;
        executor.reset()
    }

    pub fn ensure_target_table(&self, config: &ConnectionConfig) -> Result<()> {
        let mut adapter = self.connect(config)?;
        let mut executor = Executor::new(adapter.as_mut());
        executor.ensure_table(self.dialect.create_table_sql())
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        tracing::info!(
            dialect = self.dialect.name(),
            database = %config.database,
            "connecting for savepoint probe"
        );
        self.dialect.connect(config)
    }
}
