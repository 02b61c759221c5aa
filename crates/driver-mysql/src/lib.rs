use saveql_core::{ConnectionConfig, DatabaseAdapter, Dialect, Result};

mod adapter;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS customer (id BIGINT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(255) NOT NULL, email VARCHAR(255) NOT NULL) ENGINE=InnoDB";

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn create_table_sql(&self) -> &str {
        CREATE_TABLE_SQL
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
        adapter::connect(config)
    }
}
