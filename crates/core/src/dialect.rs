use crate::{ConnectionConfig, DatabaseAdapter, Result};

pub trait Dialect: Send + Sync {
    fn name(&self) -> &str;
    fn create_table_sql(&self) -> &str;
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>>;
}
