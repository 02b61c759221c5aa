use std::{
    error::Error as StdError,
    io,
    sync::{Mutex, MutexGuard},
};

use rusqlite::Connection;
use saveql_core::{
    ConnectionConfig, CustomerRow, DataAccessError, DatabaseAdapter, Result, Session,
    TABLE_STATE_QUERY, Version,
};

const BEGIN_SQL: &str = "BEGIN";
const COMMIT_SQL: &str = "COMMIT";
const CONNECT_SQL: &str = "CONNECT sqlite";
const SHOW_SERVER_VERSION_QUERY: &str = "SELECT sqlite_version()";
const MINIMUM_SQLITE_MAJOR_VERSION: u16 = 3;
const MINIMUM_SQLITE_MINOR_VERSION: u16 = 6;
const MINIMUM_SQLITE_PATCH_VERSION: u16 = 8;
const SERVER_VERSION_OVERRIDE_KEY: &str = "sqlite.server_version";
const POISONED_CONNECTION_MESSAGE: &str = "sqlite connection state was poisoned";

pub(crate) struct SqliteAdapter {
    connection: Mutex<Connection>,
    server_version: Version,
}

pub(crate) fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
    if let Some(raw_version) = config.extra.get(SERVER_VERSION_OVERRIDE_KEY) {
        let version = parse_server_version(raw_version)
            .ok_or_else(|| invalid_server_version_error(raw_version))?;
        ensure_minimum_version(&version, raw_version)?;
    }

    let connection = Connection::open(config.database.as_str())
        .map_err(|source| execution_error(CONNECT_SQL, source))?;
    tracing::debug!(database = %config.database, "opened sqlite database");

    let server_version_raw =
        if let Some(raw_version) = config.extra.get(SERVER_VERSION_OVERRIDE_KEY) {
            raw_version.clone()
        } else {
            query_server_version(&connection)?
        };
    let server_version = parse_server_version(&server_version_raw)
        .ok_or_else(|| invalid_server_version_error(&server_version_raw))?;
    ensure_minimum_version(&server_version, &server_version_raw)?;

    Ok(Box::new(SqliteAdapter {
        connection: Mutex::new(connection),
        server_version,
    }))
}

impl SqliteAdapter {
    fn lock_connection(&self, sql: &str) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| execution_error(sql, io::Error::other(POISONED_CONNECTION_MESSAGE)))
    }
}

impl DatabaseAdapter for SqliteAdapter {
    fn execute(&self, sql: &str) -> Result<()> {
        let connection = self.lock_connection(sql)?;
        connection
            .execute_batch(sql)
            .map_err(|source| execution_error(sql, source))
    }

    fn table_state(&self) -> Result<Vec<CustomerRow>> {
        let connection = self.lock_connection(TABLE_STATE_QUERY)?;
        let mut statement = connection
            .prepare(TABLE_STATE_QUERY)
            .map_err(|source| execution_error(TABLE_STATE_QUERY, source))?;
        let mut rows = statement
            .query([])
            .map_err(|source| execution_error(TABLE_STATE_QUERY, source))?;

        let mut state = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|source| execution_error(TABLE_STATE_QUERY, source))?
        {
            let decode = || -> rusqlite::Result<CustomerRow> {
                Ok(CustomerRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            };
            state.push(decode().map_err(|source| execution_error(TABLE_STATE_QUERY, source))?);
        }

        Ok(state)
    }

    // SQLite has no server-side auto-commit switch. Like its JDBC driver,
    // disabling auto-commit opens an explicit transaction and re-enabling
    // commits it; `is_autocommit` keeps the toggle idempotent.
    fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        let sql = if enabled { COMMIT_SQL } else { BEGIN_SQL };
        let connection = self.lock_connection(sql)?;

        if connection.is_autocommit() == enabled {
            return Ok(());
        }

        connection
            .execute_batch(sql)
            .map_err(|source| execution_error(sql, source))
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

fn query_server_version(connection: &Connection) -> Result<String> {
    connection
        .query_row(SHOW_SERVER_VERSION_QUERY, [], |row| row.get(0))
        .map_err(|source| execution_error(SHOW_SERVER_VERSION_QUERY, source))
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
        MINIMUM_SQLITE_MAJOR_VERSION,
        MINIMUM_SQLITE_MINOR_VERSION,
        MINIMUM_SQLITE_PATCH_VERSION,
    );
    if (version.major, version.minor, version.patch) >= minimum {
        return Ok(());
    }

    Err(execution_error(
        SHOW_SERVER_VERSION_QUERY,
        io::Error::other(format!(
            "sqlite server version `{raw_version}` is not supported; savepoints require {MINIMUM_SQLITE_MAJOR_VERSION}.{MINIMUM_SQLITE_MINOR_VERSION}.{MINIMUM_SQLITE_PATCH_VERSION}+"
        )),
    ))
}

fn invalid_server_version_error(raw_version: &str) -> saveql_core::Error {
    execution_error(
        SHOW_SERVER_VERSION_QUERY,
        io::Error::other(format!(
            "failed to parse sqlite server version string: `{raw_version}`"
        )),
    )
}

fn execution_error<E>(sql: &str, source: E) -> saveql_core::Error
where
    E: StdError + Send + Sync + 'static,
{
    DataAccessError::statement_failed(0, sql, 0, source).into()
}
