pub const TARGET_TABLE: &str = "customer";
pub const TABLE_STATE_QUERY: &str = "SELECT id, name, email FROM customer ORDER BY id";
pub const RESET_SQL: &str = "DELETE FROM customer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub email: String,
}

pub fn insert_customer_sql(name: &str, email: &str) -> String {
    format!(
        "INSERT INTO customer (name, email) VALUES ('{}', '{}')",
        escape_literal(name),
        escape_literal(email)
    )
}

fn escape_literal(raw: &str) -> String {
    raw.replace('\'', "''")
}
