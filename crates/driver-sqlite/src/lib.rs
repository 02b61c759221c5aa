use saveql_core::{ConnectionConfig, DatabaseAdapter, Dialect, Result};

mod adapter;

// Without AUTOINCREMENT, SQLite may reuse rowids of deleted rows; the probe
// relies on monotonic ids to observe autoincrement continuity.
const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS customer (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, email TEXT NOT NULL)";

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn create_table_sql(&self) -> &str {
        CREATE_TABLE_SQL
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        adapter::connect(config)
    }
}
