//! Result rendering: text, table and JSON

use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::{sorted, RunResults, Summary};
use crate::common::Result;

/// Renders the aggregated results of a run
pub trait ResultWriter: Send + Sync {
    fn write(&self, results: &RunResults, out: &mut dyn Write) -> Result<()>;
}

/// Select a writer by name; unknown names fall back to text
pub fn for_format(name: &str, json_output_path: Option<PathBuf>) -> Box<dyn ResultWriter> {
    match name.to_ascii_lowercase().as_str() {
        "table" => Box::new(TableResultWriter),
        "json" => Box::new(JsonResultWriter {
            output_path: json_output_path,
        }),
        _ => Box::new(TextResultWriter),
    }
}

/// Coloured per-case listing followed by summary counts
#[derive(Debug, Default, Clone, Copy)]
pub struct TextResultWriter;

impl ResultWriter for TextResultWriter {
    fn write(&self, results: &RunResults, out: &mut dyn Write) -> Result<()> {
        for (name, definition) in sorted(results) {
            writeln!(
                out,
                "{}",
                format!("{}: {}", name, definition.path.display()).cyan()
            )?;

            for suite in &definition.suites {
                writeln!(out, "  Suite: {}", suite.name)?;

                for case in &suite.cases {
                    let status = if case.passed {
                        "PASS".green()
                    } else {
                        "FAIL".red()
                    };
                    writeln!(
                        out,
                        "    {} ({:.2} ms): {}",
                        case.title,
                        case.timing * 1000.0,
                        status
                    )?;

                    if !case.passed && !case.failure_reasons.is_empty() {
                        writeln!(out, "      Failures:")?;
                        for reason in &case.failure_reasons {
                            writeln!(out, "        - {}", reason)?;
                        }
                    }
                }
            }
        }

        let summary = Summary::of(results);
        writeln!(out)?;
        writeln!(
            out,
            "Test Suites: {}, {} total",
            format!("{} passed", summary.passed_suites).green(),
            summary.total_suites
        )?;
        writeln!(
            out,
            "Test Cases: {}, {} total",
            format!("{} passed", summary.passed_cases).green(),
            summary.total_cases
        )?;
        writeln!(out, "Total time: {:.2} ms", summary.total_time_ms)?;
        Ok(())
    }
}

/// Aligned table, one row per case, with pass rates per suite and overall
#[derive(Debug, Default, Clone, Copy)]
pub struct TableResultWriter;

const FAILURE_WIDTH: usize = 32;

impl TableResultWriter {
    fn failure_cell(reasons: &[String]) -> String {
        let Some(first) = reasons.first() else {
            return String::new();
        };

        let mut cell: String = if first.chars().count() > FAILURE_WIDTH {
            let head: String = first.chars().take(FAILURE_WIDTH - 3).collect();
            format!("{}...", head)
        } else {
            first.clone()
        };
        if reasons.len() > 1 {
            cell.push_str(&format!(" (+{} more)", reasons.len() - 1));
        }
        cell
    }
}

impl ResultWriter for TableResultWriter {
    fn write(&self, results: &RunResults, out: &mut dyn Write) -> Result<()> {
        let mut rows: Vec<[String; 5]> = Vec::new();
        for (name, definition) in sorted(results) {
            let mut def_cell = name.clone();
            for suite in &definition.suites {
                let mut suite_cell = format!(
                    "{} ({}/{})",
                    suite.name,
                    suite.passed_cases(),
                    suite.cases.len()
                );
                for case in &suite.cases {
                    let result = if case.passed { "PASS" } else { "FAIL" };
                    rows.push([
                        std::mem::take(&mut def_cell),
                        std::mem::take(&mut suite_cell),
                        case.title.clone(),
                        result.to_string(),
                        Self::failure_cell(&case.failure_reasons),
                    ]);
                }
            }
        }

        let header = ["Definition", "Suite", "Case", "Result", "Failures"];
        let mut widths = header.map(|h| h.len());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let border = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        let line = |cells: &[&str]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
                .collect();
            format!("|{}|", padded.join("|"))
        };

        writeln!(out, "+{}+", border)?;
        writeln!(out, "{}", line(&header[..]))?;
        writeln!(out, "+{}+", border)?;
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            writeln!(out, "{}", line(&cells))?;
        }
        writeln!(out, "+{}+", border)?;

        for (name, definition) in sorted(results) {
            for suite in &definition.suites {
                writeln!(
                    out,
                    "Suite Summary: {}/{}: {}/{} tests passed ({:.1}%)",
                    name,
                    suite.name,
                    suite.passed_cases(),
                    suite.cases.len(),
                    pass_rate(suite.passed_cases(), suite.cases.len())
                )?;
            }
        }

        let summary = Summary::of(results);
        writeln!(
            out,
            "Passed: {}/{} cases ({:.1}%), {}/{} suites",
            summary.passed_cases,
            summary.total_cases,
            pass_rate(summary.passed_cases, summary.total_cases),
            summary.passed_suites,
            summary.total_suites
        )?;
        Ok(())
    }
}

/// Percentage of passing cases; an empty set counts as fully passing
fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        passed as f64 * 100.0 / total as f64
    }
}

/// Pretty JSON report written to a file, or to the output when no path is set
#[derive(Debug, Default, Clone)]
pub struct JsonResultWriter {
    pub output_path: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    test_definitions: Vec<JsonDefinition<'a>>,
    summary: Summary,
}

#[derive(Serialize)]
struct JsonDefinition<'a> {
    name: &'a str,
    path: String,
    suites: Vec<JsonSuite<'a>>,
}

#[derive(Serialize)]
struct JsonSuite<'a> {
    name: &'a str,
    cases: Vec<JsonCase<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonCase<'a> {
    name: &'a str,
    passed: bool,
    timing_ms: f64,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    failure_reasons: &'a [String],
}

impl JsonResultWriter {
    fn report(results: &RunResults) -> JsonReport<'_> {
        let test_definitions = sorted(results)
            .into_iter()
            .map(|(name, definition)| JsonDefinition {
                name,
                path: definition.path.display().to_string(),
                suites: definition
                    .suites
                    .iter()
                    .map(|suite| JsonSuite {
                        name: &suite.name,
                        cases: suite
                            .cases
                            .iter()
                            .map(|case| JsonCase {
                                name: &case.title,
                                passed: case.passed,
                                timing_ms: case.timing * 1000.0,
                                failure_reasons: &case.failure_reasons,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        JsonReport {
            test_definitions,
            summary: Summary::of(results),
        }
    }
}

impl ResultWriter for JsonResultWriter {
    fn write(&self, results: &RunResults, out: &mut dyn Write) -> Result<()> {
        let document = serde_json::to_string_pretty(&Self::report(results))?;

        match &self.output_path {
            Some(path) => {
                std::fs::write(path, document)?;
                writeln!(out, "Test results written to {}", path.display())?;
            }
            None => writeln!(out, "{}", document)?,
        }
        Ok(())
    }
}
