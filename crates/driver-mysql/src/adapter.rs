use std::{
    error::Error as StdError,
    io,
    sync::{Mutex, MutexGuard},
};

use mysql::{OptsBuilder, Pool, PooledConn, prelude::Queryable};
use saveql_core::{
    ConnectionConfig, CustomerRow, DataAccessError, DatabaseAdapter, Result, Session,
    TABLE_STATE_QUERY, Version,
};

const AUTO_COMMIT_OFF_SQL: &str = "SET autocommit=0";
const AUTO_COMMIT_ON_SQL: &str = "SET autocommit=1";
const CONNECT_SQL: &str = "CONNECT mysql";
const DEFAULT_MYSQL_HOST: &str = "127.0.0.1";
const DEFAULT_MYSQL_PORT: u16 = 3306;
const SHOW_SERVER_VERSION_QUERY: &str = "SELECT VERSION()";
const MINIMUM_MYSQL_MAJOR_VERSION: u16 = 5;
const MINIMUM_MYSQL_MINOR_VERSION: u16 = 0;
const MINIMUM_MYSQL_PATCH_VERSION: u16 = 3;
const SERVER_VERSION_OVERRIDE_KEY: &str = "mysql.server_version";
const POISONED_CONNECTION_MESSAGE: &str = "mysql connection state was poisoned";

pub(crate) struct MysqlAdapter {
    connection: Mutex<PooledConn>,
    server_version: Version,
}

pub(crate) fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseAdapter>> {
    if let Some(raw_version) = config.extra.get(SERVER_VERSION_OVERRIDE_KEY) {
        let version = parse_server_version(raw_version)
            .ok_or_else(|| invalid_server_version_error(raw_version))?;
        ensure_minimum_version(&version, raw_version)?;
    }

    let mut connection = connect_connection(config)?;
    tracing::debug!(host = ?config.host, database = %config.database, "connected to mysql server");

    let server_version_raw =
        if let Some(raw_version) = config.extra.get(SERVER_VERSION_OVERRIDE_KEY) {
            raw_version.clone()
        } else {
            query_scalar(&mut connection, SHOW_SERVER_VERSION_QUERY)?
        };
    let server_version = parse_server_version(&server_version_raw)
        .ok_or_else(|| invalid_server_version_error(&server_version_raw))?;
    ensure_minimum_version(&server_version, &server_version_raw)?;

    Ok(Box::new(MysqlAdapter {
        connection: Mutex::new(connection),
        server_version,
    }))
}

impl MysqlAdapter {
    fn lock_connection(&self, sql: &str) -> Result<MutexGuard<'_, PooledConn>> {
        self.connection
            .lock()
            .map_err(|_| execution_error(sql, io::Error::other(POISONED_CONNECTION_MESSAGE)))
    }
}

impl DatabaseAdapter for MysqlAdapter {
    fn execute(&self, sql: &str) -> Result<()> {
        let mut connection = self.lock_connection(sql)?;
        connection
            .query_drop(sql)
            .map_err(|source| execution_error(sql, source))
    }

    fn table_state(&self) -> Result<Vec<CustomerRow>> {
        let mut connection = self.lock_connection(TABLE_STATE_QUERY)?;
        let rows = connection
            .query::<(i64, String, String), _>(TABLE_STATE_QUERY)
            .map_err(|source| execution_error(TABLE_STATE_QUERY, source))?;

        Ok(rows
            .into_iter()
            .map(|(id, name, email)| CustomerRow { id, name, email })
            .collect())
    }

    // MySQL has a genuine session auto-commit flag. Turning it back on while
    // a transaction is open makes the server commit that transaction.
    fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        let sql = if enabled {
            AUTO_COMMIT_ON_SQL
        } else {
            AUTO_COMMIT_OFF_SQL
        };
        let mut connection = self.lock_connection(sql)?;
        connection
            .query_drop(sql)
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

fn connect_connection(config: &ConnectionConfig) -> Result<PooledConn> {
    let mut builder = OptsBuilder::new()
        .ip_or_hostname(config.host.clone().or(Some(DEFAULT_MYSQL_HOST.to_string())))
        .tcp_port(config.port.unwrap_or(DEFAULT_MYSQL_PORT))
        .user(config.user.clone())
        .pass(config.password.clone())
        .db_name(Some(config.database.clone()));
    if let Some(socket) = &config.socket {
        builder = builder.socket(Some(socket.clone()));
    }

    let pool = Pool::new(builder).map_err(|source| execution_error(CONNECT_SQL, source))?;
    pool.get_conn()
        .map_err(|source| execution_error(CONNECT_SQL, source))
}

fn query_scalar(connection: &mut PooledConn, sql: &str) -> Result<String> {
    connection
        .query_first::<String, _>(sql)
        .map_err(|source| execution_error(sql, source))?
        .ok_or_else(|| execution_error(sql, io::Error::other("query returned no rows")))
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
        MINIMUM_MYSQL_MAJOR_VERSION,
        MINIMUM_MYSQL_MINOR_VERSION,
        MINIMUM_MYSQL_PATCH_VERSION,
    );
    if (version.major, version.minor, version.patch) >= minimum {
        return Ok(());
    }

    Err(execution_error(
        SHOW_SERVER_VERSION_QUERY,
        io::Error::other(format!(
            "mysql server version `{raw_version}` is not supported; savepoint release requires {MINIMUM_MYSQL_MAJOR_VERSION}.{MINIMUM_MYSQL_MINOR_VERSION}.{MINIMUM_MYSQL_PATCH_VERSION}+"
        )),
    ))
}

fn invalid_server_version_error(raw_version: &str) -> saveql_core::Error {
    execution_error(
        SHOW_SERVER_VERSION_QUERY,
        io::Error::other(format!(
            "failed to parse mysql server version string: `{raw_version}`"
        )),
    )
}

fn execution_error<E>(sql: &str, source: E) -> saveql_core::Error
where
    E: StdError + Send + Sync + 'static,
{
    DataAccessError::statement_failed(0, sql, 0, source).into()
}
