//! Result tree produced by a run
//!
//! Suites and cases keep declaration order. A run returns one
//! [`DefinitionResult`] per definition name.

mod writer;

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::definition::Variables;

pub use writer::{
    for_format, JsonResultWriter, ResultWriter, TableResultWriter, TextResultWriter,
};

/// Aggregated results keyed by definition name
pub type RunResults = HashMap<String, DefinitionResult>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DefinitionResult {
    pub path: PathBuf,
    pub suites: Vec<SuiteResult>,
}

impl DefinitionResult {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            suites: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.suites.iter().all(SuiteResult::passed)
    }

    pub fn suite(&self, name: &str) -> Option<&SuiteResult> {
        self.suites.iter().find(|suite| suite.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteResult {
    pub name: String,
    pub cases: Vec<CaseResult>,
    /// Suite scope after every case and hook export was merged
    #[serde(skip)]
    pub variables: Variables,
}

impl SuiteResult {
    /// True iff every case passed
    pub fn passed(&self) -> bool {
        self.cases.iter().all(|case| case.passed)
    }

    pub fn case(&self, title: &str) -> Option<&CaseResult> {
        self.cases.iter().find(|case| case.title == title)
    }

    pub fn passed_cases(&self) -> usize {
        self.cases.iter().filter(|case| case.passed).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseResult {
    pub title: String,
    pub passed: bool,
    /// Wall-clock time in seconds
    pub timing: f64,
    pub failure_reasons: Vec<String>,
}

impl CaseResult {
    /// A case that could not be executed
    pub fn failed(title: &str, timing: f64, reason: String) -> Self {
        Self {
            title: title.to_string(),
            passed: false,
            timing,
            failure_reasons: vec![reason],
        }
    }
}

/// Counts across a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_test_definitions: usize,
    pub total_suites: usize,
    pub passed_suites: usize,
    pub total_cases: usize,
    pub passed_cases: usize,
    pub total_time_ms: f64,
}

impl Summary {
    pub fn of(results: &RunResults) -> Self {
        let mut summary = Summary {
            total_test_definitions: results.len(),
            ..Summary::default()
        };

        for suite in results.values().flat_map(|def| &def.suites) {
            summary.total_suites += 1;
            if suite.passed() {
                summary.passed_suites += 1;
            }
            summary.total_cases += suite.cases.len();
            summary.passed_cases += suite.passed_cases();
            summary.total_time_ms += suite.cases.iter().map(|c| c.timing * 1000.0).sum::<f64>();
        }

        summary
    }

    pub fn all_passed(&self) -> bool {
        self.passed_cases == self.total_cases
    }
}

/// Definition names in a stable order for rendering
pub(crate) fn sorted(results: &RunResults) -> Vec<(&String, &DefinitionResult)> {
    let mut entries: Vec<_> = results.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn case(title: &str, passed: bool, reasons: &[&str]) -> CaseResult {
        CaseResult {
            title: title.to_string(),
            passed,
            timing: 0.25,
            failure_reasons: reasons.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn results() -> RunResults {
        let mut results = RunResults::new();
        results.insert(
            "users".to_string(),
            DefinitionResult {
                path: PathBuf::from("tests/users.yaml"),
                suites: vec![
                    SuiteResult {
                        name: "crud".to_string(),
                        cases: vec![
                            case("create user", true, &[]),
                            case(
                                "fetch user",
                                false,
                                &["expected status code 200, got 404", "header 'ETag' not found in response"],
                            ),
                        ],
                        variables: Variables::new(),
                    },
                    SuiteResult {
                        name: "health".to_string(),
                        cases: vec![case("ping", true, &[])],
                        variables: Variables::new(),
                    },
                ],
            },
        );
        results
    }
}
