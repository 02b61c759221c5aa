mod error_presentation;

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use saveql_core::{
    AUTO_COMMIT_SCENARIO, ConnectionConfig, Dialect, MatrixEntry, ProbeReport, SavepointProbe,
    Scenario, ScriptError, scenarios,
};
use saveql_testkit::{
    ProbeCase, TestResult, error_chain_text, load_probe_cases_from_str, run_online_case,
    standard_matrix,
};

use crate::error_presentation::{CliError, CliResult, render_runtime_error};

#[derive(Parser)]
#[command(
    name = "saveql",
    version,
    about = "Probes savepoint and auto-commit semantics of SQL engines with scripted scenarios"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe a MySQL server.
    #[cfg(feature = "mysql")]
    Mysql(ServerArgs),
    /// Probe a PostgreSQL server.
    #[cfg(feature = "postgres")]
    Postgres(ServerArgs),
    /// Probe a SQLite database file.
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteArgs),
}

#[derive(Args)]
struct ServerArgs {
    /// Server host name or address.
    #[arg(long)]
    host: Option<String>,
    /// Server TCP port.
    #[arg(long)]
    port: Option<u16>,
    /// User to authenticate as.
    #[arg(long)]
    user: Option<String>,
    /// Password to authenticate with.
    #[arg(long)]
    password: Option<String>,
    /// Unix domain socket path, used instead of host and port.
    #[arg(long)]
    socket: Option<String>,
    /// Database holding the probe table.
    database: String,
    #[command(flatten)]
    probe: ProbeOptions,
}

#[derive(Args)]
struct SqliteArgs {
    /// Database file path, or `:memory:` for a throwaway database.
    database: String,
    #[command(flatten)]
    probe: ProbeOptions,
}

#[derive(Args)]
struct ProbeOptions {
    /// Run one named scenario; repeat the flag to run several.
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,
    /// Run every scenario in the library. This is also the default action.
    #[arg(long, conflicts_with = "scenarios")]
    all: bool,
    /// Check the shared conformance matrix and exit non-zero on mismatch.
    #[arg(long, conflicts_with_all = ["scenarios", "all", "cases", "auto_commit"])]
    matrix: bool,
    /// Run probe cases from a YAML file instead of the built-in library.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["scenarios", "all", "auto_commit"])]
    cases: Option<PathBuf>,
    /// Probe the auto-commit toggle instead of running a savepoint script.
    #[arg(long)]
    auto_commit: bool,
    /// Clear the probe table and exit.
    #[arg(long)]
    reset: bool,
    /// List the scenario library and exit.
    #[arg(long)]
    list_scenarios: bool,
    /// Log probe execution to stderr.
    #[arg(long)]
    verbose: bool,
}

impl ServerArgs {
    fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            socket: self.socket.clone(),
            extra: BTreeMap::new(),
        }
    }
}

impl SqliteArgs {
    fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: None,
            port: None,
            user: None,
            password: None,
            database: self.database.clone(),
            socket: None,
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", render_runtime_error(error));
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(any(feature = "mysql", feature = "postgres", feature = "sqlite")))]
fn main() -> ExitCode {
    eprintln!("{}", render_runtime_error(CliError::NoDriversEnabled));
    ExitCode::from(2)
}

fn run(command: Command) -> CliResult<ExitCode> {
    match command {
        #[cfg(feature = "mysql")]
        Command::Mysql(args) => probe_dialect(
            &saveql_driver_mysql::MysqlDialect,
            &args.connection_config(),
            &args.probe,
        ),
        #[cfg(feature = "postgres")]
        Command::Postgres(args) => probe_dialect(
            &saveql_driver_postgres::PostgresDialect,
            &args.connection_config(),
            &args.probe,
        ),
        #[cfg(feature = "sqlite")]
        Command::Sqlite(args) => probe_dialect(
            &saveql_driver_sqlite::SqliteDialect,
            &args.connection_config(),
            &args.probe,
        ),
    }
}

fn probe_dialect(
    dialect: &dyn Dialect,
    config: &ConnectionConfig,
    options: &ProbeOptions,
) -> CliResult<ExitCode> {
    if options.verbose {
        init_tracing();
    }

    if options.list_scenarios {
        for scenario in scenarios::all() {
            println!("{}", scenario.name);
        }
        println!("{AUTO_COMMIT_SCENARIO}");
        return Ok(ExitCode::SUCCESS);
    }

    let probe = SavepointProbe::new(dialect);

    if options.reset {
        probe.reset_state(config)?;
        println!("probe table cleared");
        return Ok(ExitCode::SUCCESS);
    }
    if options.matrix {
        return run_cases(dialect, config, &standard_matrix());
    }
    if let Some(path) = &options.cases {
        let cases = load_cases(path)?;
        return run_cases(dialect, config, &cases);
    }
    if options.auto_commit {
        let report = probe.auto_commit_toggle(config)?;
        print_report(&report);
        return Ok(ExitCode::SUCCESS);
    }

    // A scenario that errors is a finding about the engine, not a probe
    // failure; the exit code stays zero as long as the run itself worked.
    let selected = select_scenarios(options)?;
    let entries = probe.run_matrix(config, &selected)?;
    for entry in &entries {
        print_entry(entry);
    }
    Ok(ExitCode::SUCCESS)
}

fn select_scenarios(options: &ProbeOptions) -> CliResult<Vec<Scenario>> {
    if options.scenarios.is_empty() {
        return Ok(scenarios::all());
    }

    options
        .scenarios
        .iter()
        .map(|name| {
            scenarios::by_name(name).ok_or_else(|| {
                CliError::Core(ScriptError::UnknownScenario { name: name.clone() }.into())
            })
        })
        .collect()
}

fn run_cases(
    dialect: &dyn Dialect,
    config: &ConnectionConfig,
    cases: &BTreeMap<String, ProbeCase>,
) -> CliResult<ExitCode> {
    let mut adapter = dialect.connect(config)?;

    let mut failures = 0usize;
    for (name, case) in cases {
        match run_online_case(dialect, adapter.as_mut(), name, case) {
            TestResult::Passed => println!("pass {name}"),
            TestResult::Skipped(reason) => println!("skip {name} ({reason})"),
            TestResult::Failed(message) => {
                failures += 1;
                println!("fail {name}: {message}");
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} of {} cases failed", cases.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn load_cases(path: &Path) -> CliResult<BTreeMap<String, ProbeCase>> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::ReadCaseFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(load_probe_cases_from_str(&raw)?)
}

fn print_entry(entry: &MatrixEntry) {
    match &entry.outcome {
        Ok(report) => print_report(report),
        Err(error) => println!("err  {} {}", entry.scenario, error_chain_text(error)),
    }
}

fn print_report(report: &ProbeReport) {
    println!(
        "ok   {} names={:?} ids={:?}",
        report.scenario,
        report.names(),
        report.ids()
    );
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "saveql_core=debug,saveql_testkit=debug,saveql_driver_sqlite=debug,\
             saveql_driver_mysql=debug,saveql_driver_postgres=debug",
        )
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
