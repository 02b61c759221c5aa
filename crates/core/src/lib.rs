mod adapter;
mod config;
mod dialect;
mod error;
mod executor;
mod probe;
pub mod scenarios;
mod script;
mod session;
mod target;

pub use adapter::DatabaseAdapter;
pub use config::{ConnectionConfig, Version};
pub use dialect::Dialect;
pub use error::{DataAccessError, Error, Result, ScriptError, SourceLocation, VerifyError};
pub use executor::{AUTO_COMMIT_SCENARIO, Executor};
pub use probe::{MatrixEntry, ProbeReport, SavepointProbe};
pub use script::{Scenario, ScriptOp, rendered_statements};
pub use session::{Savepoint, Session};
pub use target::{CustomerRow, RESET_SQL, TABLE_STATE_QUERY, TARGET_TABLE, insert_customer_sql};
