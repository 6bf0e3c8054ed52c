//! Suite and case execution

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use crate::assertion::{validate_all, AssertionBuilder, AssertionContext};
use crate::common::Result;
use crate::definition::{value_to_text, BodyExport, Case, RequestBody, Suite, Variable, Variables};
use crate::http::{HttpClient, Method, RequestParams};
use crate::interpolate::{interpolate_request, reencode_json, Environment};
use crate::jsonpath;
use crate::results::{CaseResult, SuiteResult};

/// Everything a case needs, cheap to clone into a task
#[derive(Clone)]
pub struct CaseExecutor {
    pub client: Arc<dyn HttpClient>,
    pub env: Arc<Environment>,
    pub assertions: Arc<AssertionBuilder>,
}

impl CaseExecutor {
    /// Run one case against its own copy of the suite variables.
    ///
    /// Hard errors (interpolation, unsupported method, transport, assertion
    /// construction) fail the case with the error as its only reason.
    pub async fn execute_case(&self, case: &Case, mut variables: Variables) -> (CaseResult, Variables) {
        let started = Instant::now();
        tracing::debug!(title = %case.title, "Running test case");

        let outcome = self.run(case, &mut variables).await;
        let timing = started.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(failure_reasons) => CaseResult {
                title: case.title.clone(),
                passed: failure_reasons.is_empty(),
                timing,
                failure_reasons,
            },
            Err(e) => {
                tracing::error!(title = %case.title, error = %e, "Error executing test case");
                CaseResult::failed(&case.title, timing, e.to_string())
            }
        };

        (result, variables)
    }

    async fn run(&self, case: &Case, variables: &mut Variables) -> Result<Vec<String>> {
        let request = interpolate_request(&case.request, variables, &self.env);
        let method: Method = request.method.parse()?;

        let body = if method.has_body() {
            build_body(&case.request.body, &request.body)?
        } else {
            None
        };
        let params = RequestParams {
            headers: request
                .headers
                .iter()
                .map(|h| (h.key.clone(), h.value.clone()))
                .collect(),
            query: Vec::new(),
        };

        tracing::debug!(%method, url = %request.url, "Executing request");
        let response = method
            .send(self.client.as_ref(), &request.url, body, &params)
            .await?;

        process_exports(&request.export.body, &response.body, variables);

        let assertions = self.assertions.build(&request.assertions)?;
        let failures = validate_all(&assertions, &AssertionContext::from_response(&response));
        for failure in &failures {
            tracing::debug!(title = %case.title, %failure, "Assertion failed");
        }
        Ok(failures)
    }
}

/// Run every case of `suite` with `variables` as the starting scope.
///
/// Concurrent suites give each case a snapshot of the scope taken at launch
/// and merge the returned scopes in completion order.
pub async fn run_suite(executor: &CaseExecutor, suite: &Suite, mut variables: Variables) -> SuiteResult {
    tracing::debug!(suite = %suite.name, concurrent = suite.is_concurrent(), "Executing test suite");

    let cases = if suite.is_concurrent() {
        let mut slots: Vec<Option<CaseResult>> = vec![None; suite.cases.len()];
        let mut tasks = JoinSet::new();

        for (index, case) in suite.cases.iter().enumerate() {
            let executor = executor.clone();
            let case = case.clone();
            let snapshot = variables.clone();
            tasks.spawn(async move {
                let (result, variables) = executor.execute_case(&case, snapshot).await;
                (index, result, variables)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result, exported)) => {
                    variables.extend(exported);
                    slots[index] = Some(result);
                }
                Err(e) => tracing::error!(suite = %suite.name, error = %e, "Test case task failed"),
            }
        }

        slots
            .into_iter()
            .zip(&suite.cases)
            .map(|(slot, case)| {
                slot.unwrap_or_else(|| {
                    CaseResult::failed(&case.title, 0.0, "test case task failed".to_string())
                })
            })
            .collect()
    } else {
        let mut cases = Vec::with_capacity(suite.cases.len());
        for case in &suite.cases {
            let (result, updated) = executor
                .execute_case(case, std::mem::take(&mut variables))
                .await;
            variables = updated;
            cases.push(result);
        }
        cases
    };

    SuiteResult {
        name: suite.name.clone(),
        cases,
        variables,
    }
}

/// Body sent for POST, PUT and PATCH.
///
/// A JSON body given as text is decoded. Text that was valid JSON before
/// interpolation but not after is an error; text that never was JSON is sent
/// as a JSON string.
fn build_body(declared: &RequestBody, interpolated: &RequestBody) -> Result<Option<Value>> {
    let Some(data) = &interpolated.data else {
        return Ok(None);
    };
    if !interpolated.is_json() {
        return Ok(Some(data.clone()));
    }

    match data {
        Value::String(text) => match reencode_json(text) {
            Ok(value) => Ok(Some(value)),
            Err(e) if was_json(declared) => Err(e),
            Err(_) => Ok(Some(Value::String(text.clone()))),
        },
        structured => Ok(Some(structured.clone())),
    }
}

fn was_json(body: &RequestBody) -> bool {
    body.data
        .as_ref()
        .and_then(Value::as_str)
        .is_some_and(|text| serde_json::from_str::<Value>(text).is_ok())
}

/// Write exported response values into `variables`. Never fails the case.
fn process_exports(exports: &[BodyExport], body: &[u8], variables: &mut Variables) {
    if exports.is_empty() {
        return;
    }

    let json: Value = match serde_json::from_slice(body) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Response body is not JSON, skipping exports");
            return;
        }
    };

    for export in exports {
        if export.path.is_empty() || export.variable_name.is_empty() {
            tracing::warn!("Skipping body export with empty path or variable name");
            continue;
        }

        match jsonpath::lookup(&export.path, &json) {
            Ok(Some(value)) => {
                let text = value_to_text(&value);
                tracing::debug!(variable = %export.variable_name, value = %text, "Exported response value");
                variables.insert(export.variable_name.clone(), Variable::string(text));
            }
            Ok(None) => {
                tracing::warn!(path = %export.path, "JSONPath matched nothing, skipping export");
            }
            Err(e) => {
                tracing::warn!(path = %export.path, error = %e, "Error extracting export");
            }
        }
    }
}
