use crate::{CustomerRow, Result, Session, Version};

pub trait DatabaseAdapter {
    fn execute(&self, sql: &str) -> Result<()>;
    fn table_state(&self) -> Result<Vec<CustomerRow>>;
    fn set_auto_commit(&self, enabled: bool) -> Result<()>;
    fn begin_probe(&mut self) -> Result<Session<'_>>;
    fn server_version(&self) -> Result<Version>;
}
