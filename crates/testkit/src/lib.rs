mod case_runner;
mod matrix;

pub use case_runner::{
    CaseStep, ProbeCase, TestResult, error_chain_text, load_probe_cases_from_str, matches_flavor,
    run_offline_case, run_online_case, scenario_from_case,
};
pub use matrix::standard_matrix;
