use std::{
    error::Error as StdError,
    io,
    sync::{Mutex, MutexGuard},
};

use postgres::{Client, NoTls, Row, types::FromSqlOwned};
use saveql_core::{
    ConnectionConfig, CustomerRow, DataAccessError, DatabaseAdapter, Result, Session,
    TABLE_STATE_QUERY, Version,
};

const BEGIN_SQL: &str = "BEGIN";
const COMMIT_SQL: &str = "COMMIT";
const CONNECT_SQL: &str = "CONNECT postgres";
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const SHOW_SERVER_VERSION_QUERY: &str = "SHOW server_version";
// Savepoints date back to PostgreSQL 8.0, but the CREATE TABLE IF NOT
// EXISTS bootstrap needs 9.1.
const MINIMUM_POSTGRES_MAJOR_VERSION: u16 = 9;
const MINIMUM_POSTGRES_MINOR_VERSION: u16 = 1;
const SERVER_VERSION_OVERRIDE_KEY: &str = "postgres.server_version";
const POISONED_CLIENT_MESSAGE: &str = "postgres connection state was poisoned";

pub(crate) struct PostgresAdapter {
    client: Mutex<Client>,
    server_version: Version,
}

pub(crate) fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
    if let Some(raw_version) = config.extra.get(SERVER_VERSION_OVERRIDE_KEY) {
        let version = parse_server_version(raw_version)
            .ok_or_else(|| invalid_server_version_error(raw_version))?;
        ensure_minimum_version(&version, raw_version)?;
    }

    let mut client = connect_client(config)?;
    tracing::debug!(host = ?config.host, database = %config.database, "connected to postgres server");

    let server_version_raw =
        if let Some(raw_version) = config.extra.get(SERVER_VERSION_OVERRIDE_KEY) {
            raw_version.clone()
        } else {
            query_scalar(&mut client, SHOW_SERVER_VERSION_QUERY)?
        };
    let server_version = parse_server_version(&server_version_raw)
        .ok_or_else(|| invalid_server_version_error(&server_version_raw))?;
    ensure_minimum_version(&server_version, &server_version_raw)?;

    Ok(Box::new(PostgresAdapter {
        client: Mutex::new(client),
        server_version,
    }))
}

impl PostgresAdapter {
    fn lock_client(&self, sql: &str) -> Result<MutexGuard<'_, Client>> {
        self.client
            .lock()
            .map_err(|_| execution_error(sql, io::Error::other(POISONED_CLIENT_MESSAGE)))
    }
}

impl DatabaseAdapter for PostgresAdapter {
    fn execute(&self, sql: &str) -> Result<()> {
        let mut client = self.lock_client(sql)?;
        client
            .batch_execute(sql)
            .map_err(|source| execution_error(sql, source))
    }

    fn table_state(&self) -> Result<Vec<CustomerRow>> {
        let mut client = self.lock_client(TABLE_STATE_QUERY)?;
        let rows = client
            .query(TABLE_STATE_QUERY, &[])
            .map_err(|source| execution_error(TABLE_STATE_QUERY, source))?;
        rows.iter().map(decode_customer_row).collect()
    }

    // PostgreSQL has no session auto-commit flag; like its client drivers,
    // the toggle is emulated with an explicit transaction. A redundant BEGIN
    // or COMMIT draws a server warning, not an error, so no state is kept.
    fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        let sql = if enabled { COMMIT_SQL } else { BEGIN_SQL };
        self.execute(sql)
    }

    fn begin_probe(&mut self) -> Result<Session<'_>> {
        self.set_auto_commit(false)?;
        Ok(Session::new(self))
    }

    fn server_version(&self) -> Result<Version> {
        Ok(self.server_version.clone())
    }
}

pub(crate) fn parse_server_version(raw: &str) -> Option<Version> {
    let mut parts = raw.split_whitespace().next()?.split('.');
    let major = parse_version_component(parts.next()?)?;
    let minor = parts.next().and_then(parse_version_component).unwrap_or(0);
    let patch = parts.next().and_then(parse_version_component).unwrap_or(0);

    Some(Version {
        major,
        minor,
        patch,
    })
}

fn connect_client(config: &ConnectionConfig) -> Result<Client> {
    let mut postgres_config = postgres::Config::new();

    if let Some(socket_path) = &config.socket {
        postgres_config.host_path(socket_path);
    } else if let Some(host) = &config.host {
        postgres_config.host(host);
    } else {
        postgres_config.host(DEFAULT_POSTGRES_HOST);
    }

    if let Some(port) = config.port {
        postgres_config.port(port);
    }
    if let Some(user) = &config.user {
        postgres_config.user(user);
    }
    if let Some(password) = &config.password {
        postgres_config.password(password);
    }
    postgres_config.dbname(&config.database);

    postgres_config
        .connect(NoTls)
        .map_err(|source| execution_error(CONNECT_SQL, source))
}

fn query_scalar(client: &mut Client, sql: &str) -> Result<String> {
    let row = client
        .query_one(sql, &[])
        .map_err(|source| execution_error(sql, source))?;
    row.try_get::<_, String>(0)
        .map_err(|source| execution_error(sql, source))
}

fn decode_customer_row(row: &Row) -> Result<CustomerRow> {
    Ok(CustomerRow {
        id: row_value(row, "id", TABLE_STATE_QUERY)?,
        name: row_value(row, "name", TABLE_STATE_QUERY)?,
        email: row_value(row, "email", TABLE_STATE_QUERY)?,
    })
}

fn parse_version_component(raw: &str) -> Option<u16> {
    let digits = raw
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u16>().ok()
}

fn ensure_minimum_version(version: &Version, raw_version: &str) -> Result<()> {
    let minimum = (
        MINIMUM_POSTGRES_MAJOR_VERSION,
        MINIMUM_POSTGRES_MINOR_VERSION,
    );
    if (version.major, version.minor) >= minimum {
        return Ok(());
    }

    Err(execution_error(
        SHOW_SERVER_VERSION_QUERY,
        io::Error::other(format!(
            "postgres server version `{raw_version}` is not supported; requires {MINIMUM_POSTGRES_MAJOR_VERSION}.{MINIMUM_POSTGRES_MINOR_VERSION}+"
        )),
    ))
}

fn invalid_server_version_error(raw_version: &str) -> saveql_core::Error {
    execution_error(
        SHOW_SERVER_VERSION_QUERY,
        io::Error::other(format!(
            "failed to parse postgres server version string: `{raw_version}`"
        )),
    )
}

fn row_value<T>(row: &Row, column: &str, sql: &str) -> Result<T>
where
    T: FromSqlOwned,
{
    row.try_get(column)
        .map_err(|source| execution_error(sql, source))
}

fn execution_error<E>(sql: &str, source: E) -> saveql_core::Error
where
    E: StdError + Send + Sync + 'static,
{
    DataAccessError::statement_failed(0, sql, 0, source).into()
}
