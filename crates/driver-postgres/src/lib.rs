use saveql_core::{ConnectionConfig, DatabaseAdapter, Dialect, Result};

mod adapter;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS customer (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, email TEXT NOT NULL)";

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn create_table_sql(&self) -> &str {
        CREATE_TABLE_SQL
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        adapter::connect(config)
    }
}
