use std::{io, path::PathBuf};

use anyhow::Context;
use miette::Report;

const PROBE_CONTEXT: &str = "while running savepoint probe";
const CASE_FILE_READ_CONTEXT: &str = "while reading probe case file";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    ReadCaseFile {
        path: PathBuf,
        source: io::Error,
    },
    Core(saveql_core::Error),
    #[cfg(not(any(feature = "mysql", feature = "postgres", feature = "sqlite")))]
    NoDriversEnabled,
}

impl From<saveql_core::Error> for CliError {
    fn from(value: saveql_core::Error) -> Self {
        Self::Core(value)
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::ReadCaseFile { path, source } => {
            let context = format!("{CASE_FILE_READ_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
        CliError::Core(source) => {
            let category = core_category(&source);
            let report = report_with_context(source, PROBE_CONTEXT);
            format!("[{category}] {report}")
        }
        #[cfg(not(any(feature = "mysql", feature = "postgres", feature = "sqlite")))]
        CliError::NoDriversEnabled => format!("[config] {}", no_drivers_enabled_message()),
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let context = context.into();
    let anyhow_error = std::result::Result::<(), E>::Err(source)
        .context(context)
        .expect_err("context wrapping must produce an error");
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &saveql_core::Error) -> &'static str {
    match error {
        saveql_core::Error::Script(_) => "script",
        saveql_core::Error::DataAccess(_) => "data-access",
        saveql_core::Error::Verify(_) => "verify",
    }
}

#[cfg(not(any(feature = "mysql", feature = "postgres", feature = "sqlite")))]
fn no_drivers_enabled_message() -> &'static str {
    "no driver features are enabled for this build; enable at least one of mysql/postgres/sqlite"
}
