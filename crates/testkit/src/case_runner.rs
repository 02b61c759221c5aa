use std::{cmp::Ordering, collections::BTreeMap, error::Error as StdError};

use saveql_core::{
    DatabaseAdapter, Dialect, Executor, ProbeReport, Result, Scenario, ScriptError, ScriptOp,
    SourceLocation, VerifyError, Version, insert_customer_sql, rendered_statements,
};
use serde::Deserialize;

const CASE_SOURCE_LABEL: &str = "yaml probe case";

/// One probe case as written in YAML: a script plus the expectations to hold
/// the run against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeCase {
    pub script: Vec<CaseStep>,
    /// Expected surviving `name` column values, in id order.
    pub names: Option<Vec<String>>,
    /// Expected surviving ids. Only meaningful against a freshly created
    /// table; autoincrement counters carry history across resets.
    pub ids: Option<Vec<i64>>,
    /// Expected failure, matched as a substring of the rendered error chain.
    /// An empty string matches any failure.
    pub error: Option<String>,
    /// Expected statement trace, exactly as issued and in order.
    pub trace: Option<Vec<String>>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub flavor: Option<String>,
    /// Runner rule: `None` resolves to `true` at execution time.
    pub reset: Option<bool>,
    pub offline: bool,
}

/// Script steps in their YAML spelling. `write` inserts a customer row;
/// `sql` is the raw-statement escape hatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStep {
    Write { name: String, email: String },
    Sql(String),
    Savepoint(String),
    RollbackTo(String),
    RollbackAll,
    Release(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_probe_cases_from_str(yaml: &str) -> Result<BTreeMap<String, ProbeCase>> {
    serde_yaml::from_str(yaml).map_err(|source| parse_yaml_error(yaml, source))
}

pub fn matches_flavor(requirement: Option<&str>, current_flavor: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    if let Some(excluded_flavor) = requirement.strip_prefix('!') {
        return excluded_flavor != current_flavor;
    }

    requirement == current_flavor
}

#[must_use]
pub fn scenario_from_case(case_name: &str, case: &ProbeCase) -> Scenario {
    let script = case.script.iter().map(script_op_from_step).collect();
    Scenario::new(case_name, script)
}

/// Checks what a case claims without a database: the script must render to
/// statements, and the rendered statements must match the expected trace.
/// An expected engine failure cannot be observed offline and skips the case;
/// script-level failures (such as a rejected savepoint name) are still
/// matched against the expectation.
pub fn run_offline_case(case_name: &str, case: &ProbeCase) -> TestResult {
    match run_offline_case_flow(case_name, case) {
        Ok(()) => {
            if let Some(expected_error) = case.error.as_deref() {
                TestResult::Skipped(format!(
                    "expected failure containing `{expected_error}` needs a live engine"
                ))
            } else {
                TestResult::Passed
            }
        }
        Err(error) => match evaluate_expected_error(case_name, case, Err(error)) {
            Ok(()) => TestResult::Passed,
            Err(error) => TestResult::Failed(error.to_string()),
        },
    }
}

/// Runs a case against a live adapter: flavor and version gates first, then
/// the script through an `Executor`, then the expectations against what the
/// engine actually did.
pub fn run_online_case(
    dialect: &dyn Dialect,
    adapter: &mut dyn DatabaseAdapter,
    case_name: &str,
    case: &ProbeCase,
) -> TestResult {
    if !matches_flavor(case.flavor.as_deref(), dialect.name()) {
        return TestResult::Skipped(format!(
            "flavor requirement '{}' does not match '{}'",
            case.flavor.as_deref().unwrap_or_default(),
            dialect.name()
        ));
    }

    match evaluate_online_version_gate(adapter, case) {
        Ok(Some(skip_reason)) => TestResult::Skipped(skip_reason),
        Ok(None) => {
            let outcome = evaluate_expected_error(
                case_name,
                case,
                run_online_case_flow(dialect, adapter, case_name, case),
            );
            match outcome {
                Ok(()) => TestResult::Passed,
                Err(error) => TestResult::Failed(error.to_string()),
            }
        }
        Err(error) => TestResult::Failed(error.to_string()),
    }
}

/// Renders an error and its source chain into one line, outermost first.
/// Expected-error matching runs against this text, so driver messages deep
/// in the chain stay matchable.
#[must_use]
pub fn error_chain_text(error: &saveql_core::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = StdError::source(error);
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn run_offline_case_flow(case_name: &str, case: &ProbeCase) -> Result<()> {
    let scenario = scenario_from_case(case_name, case);
    let rendered = rendered_statements(&scenario)?;

    if let Some(expected_trace) = &case.trace
        && rendered != *expected_trace
    {
        return Err(expectation_error(
            case_name,
            format!(
                "rendered statements {rendered:?} do not match expected trace {expected_trace:?}"
            ),
        ));
    }

    Ok(())
}

fn run_online_case_flow(
    dialect: &dyn Dialect,
    adapter: &mut dyn DatabaseAdapter,
    case_name: &str,
    case: &ProbeCase,
) -> Result<()> {
    let scenario = scenario_from_case(case_name, case);

    let mut executor = Executor::new(adapter);
    executor.ensure_table(dialect.create_table_sql())?;
    if case.reset.unwrap_or(true) {
        executor.reset()?;
    }

    let report = executor.run_scenario(&scenario)?;
    assert_case_expectations(case_name, case, &report)
}

fn assert_case_expectations(case_name: &str, case: &ProbeCase, report: &ProbeReport) -> Result<()> {
    if let Some(expected_names) = &case.names {
        let actual = report.names();
        if &actual != expected_names {
            return Err(expectation_error(
                case_name,
                format!("surviving names {actual:?} do not match expected {expected_names:?}"),
            ));
        }
    }

    if let Some(expected_ids) = &case.ids {
        let actual = report.ids();
        if &actual != expected_ids {
            return Err(expectation_error(
                case_name,
                format!("surviving ids {actual:?} do not match expected {expected_ids:?}"),
            ));
        }
    }

    if let Some(expected_trace) = &case.trace
        && report.statements != *expected_trace
    {
        return Err(expectation_error(
            case_name,
            format!(
                "statement trace {:?} does not match expected {expected_trace:?}",
                report.statements
            ),
        ));
    }

    Ok(())
}

fn evaluate_expected_error(case_name: &str, case: &ProbeCase, outcome: Result<()>) -> Result<()> {
    let Some(expected_error) = case.error.as_deref() else {
        return outcome;
    };

    match outcome {
        Ok(()) => Err(expectation_error(
            case_name,
            format!("expected failure containing `{expected_error}`, but the script succeeded"),
        )),
        Err(actual_error) => {
            let chain = error_chain_text(&actual_error);
            if chain.contains(expected_error) {
                Ok(())
            } else {
                Err(expectation_error(
                    case_name,
                    format!("expected failure containing `{expected_error}`, got: {chain}"),
                ))
            }
        }
    }
}

fn evaluate_online_version_gate(
    adapter: &dyn DatabaseAdapter,
    case: &ProbeCase,
) -> Result<Option<String>> {
    let version = adapter.server_version()?;
    version_skip_reason(case, &version)
}

fn version_skip_reason(case: &ProbeCase, version: &Version) -> Result<Option<String>> {
    let rendered_version = format_version(version);

    if let Some(min_version) = normalized_version_requirement(case.min_version.as_deref())
        && compare_version_against_requirement(version, min_version)? == Ordering::Less
    {
        return Ok(Some(format!(
            "Version '{rendered_version}' is smaller than min_version '{min_version}'"
        )));
    }

    if let Some(max_version) = normalized_version_requirement(case.max_version.as_deref())
        && compare_version_against_requirement(version, max_version)? == Ordering::Greater
    {
        return Ok(Some(format!(
            "Version '{rendered_version}' is larger than max_version '{max_version}'"
        )));
    }

    Ok(None)
}

fn normalized_version_requirement(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn compare_version_against_requirement(version: &Version, requirement: &str) -> Result<Ordering> {
    let expected = parse_version_requirement(requirement)?;
    let actual = [version.major, version.minor, version.patch];

    for index in 0..actual.len().min(expected.len()) {
        match actual[index].cmp(&expected[index]) {
            Ordering::Equal => continue,
            ordering => return Ok(ordering),
        }
    }

    Ok(Ordering::Equal)
}

fn parse_version_requirement(requirement: &str) -> Result<Vec<u16>> {
    requirement
        .split('.')
        .map(|segment| parse_version_segment(requirement, segment))
        .collect()
}

fn parse_version_segment(requirement: &str, segment: &str) -> Result<u16> {
    let digits: String = segment
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Err(version_requirement_error(
            requirement,
            format!("no numeric prefix in segment '{segment}'"),
        ));
    }

    digits.parse::<u16>().map_err(|_| {
        version_requirement_error(requirement, format!("segment '{segment}' is out of range"))
    })
}

fn format_version(version: &Version) -> String {
    format!("{}.{}.{}", version.major, version.minor, version.patch)
}

fn script_op_from_step(step: &CaseStep) -> ScriptOp {
    match step {
        CaseStep::Write { name, email } => ScriptOp::Write(insert_customer_sql(name, email)),
        CaseStep::Sql(sql) => ScriptOp::Write(sql.clone()),
        CaseStep::Savepoint(name) => ScriptOp::Savepoint(name.clone()),
        CaseStep::RollbackTo(name) => ScriptOp::RollbackTo(name.clone()),
        CaseStep::RollbackAll => ScriptOp::RollbackAll,
        CaseStep::Release(name) => ScriptOp::Release(name.clone()),
    }
}

fn expectation_error(case_name: &str, mismatch: impl Into<String>) -> saveql_core::Error {
    VerifyError::Expectation {
        case: case_name.to_string(),
        mismatch: mismatch.into(),
    }
    .into()
}

fn version_requirement_error(requirement: &str, reason: impl Into<String>) -> saveql_core::Error {
    VerifyError::VersionRequirement {
        requirement: requirement.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn parse_yaml_error(yaml: &str, source: serde_yaml::Error) -> saveql_core::Error {
    let source_location = source.location().map(|location| SourceLocation {
        line: location.line(),
        column: Some(location.column()),
    });

    ScriptError::CaseConversion {
        source_excerpt: case_source_excerpt(yaml),
        source_location,
        source: Box::new(source),
    }
    .into()
}

fn case_source_excerpt(yaml: &str) -> String {
    let trimmed = yaml.trim();
    if trimmed.is_empty() {
        return CASE_SOURCE_LABEL.to_string();
    }

    const MAX_CHARS: usize = 256;
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }

    let mut excerpt: String = trimmed.chars().take(MAX_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}
