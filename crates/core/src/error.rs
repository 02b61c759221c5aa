use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: Option<usize>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("savepoint name `{name}` is not a valid identifier")]
    InvalidSavepointName { name: String },
    #[error("unknown scenario `{name}`")]
    UnknownScenario { name: String },
    #[error("probe case definition is not valid YAML")]
    CaseConversion {
        source_excerpt: String,
        source_location: Option<SourceLocation>,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("statement[{statement_index}] `{sql}` failed after {executed_statements} executed statements")]
    StatementFailed {
        statement_index: usize,
        sql: String,
        executed_statements: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl DataAccessError {
    pub fn statement_failed<E>(
        statement_index: usize,
        sql: impl Into<String>,
        executed_statements: usize,
        source: E,
    ) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::StatementFailed {
            statement_index,
            sql: sql.into(),
            executed_statements,
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("case `{case}`: {mismatch}")]
    Expectation { case: String, mismatch: String },
    #[error("invalid version requirement `{requirement}`: {reason}")]
    VersionRequirement { requirement: String, reason: String },
}
