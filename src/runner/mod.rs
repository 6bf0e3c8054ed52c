//! Execution runner
//!
//! Discovers and loads definitions, then drives each one through its
//! lifecycle:
//!
//! ```text
//! BeforeAll hooks
//!   per suite: merge variables -> BeforeEach hooks -> cases -> AfterEach hooks
//! AfterAll hooks
//! ```
//!
//! Definitions run on a pool bounded by the configured concurrency. The only
//! state they share is the [`HookGuard`].

mod hooks;
mod suite;

use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assertion::AssertionBuilder;
use crate::common::{Error, Result};
use crate::definition::{Definition, DefinitionParser};
use crate::http::HttpClient;
use crate::interpolate::Environment;
use crate::results::{DefinitionResult, RunResults};

pub use hooks::HookGuard;
pub use suite::{run_suite, CaseExecutor};

/// Collaborators and limits for a [`Runner`]
pub struct RunnerOptions {
    pub parser: Arc<dyn DefinitionParser>,
    pub client: Arc<dyn HttpClient>,
    /// Snapshot consulted by `${env:NAME}` tokens
    pub env: Arc<Environment>,
    /// Definitions executed at once; 1 or less runs them in sequence
    pub concurrency: usize,
}

pub struct Runner {
    parser: Arc<dyn DefinitionParser>,
    executor: CaseExecutor,
    concurrency: usize,
}

impl Runner {
    pub fn new(options: RunnerOptions) -> Self {
        Self {
            parser: options.parser,
            executor: CaseExecutor {
                client: options.client,
                env: options.env,
                assertions: Arc::new(AssertionBuilder::new()),
            },
            concurrency: options.concurrency,
        }
    }

    /// Replace the assertion builder, e.g. to add custom assertion types
    pub fn with_assertions(mut self, assertions: AssertionBuilder) -> Self {
        self.executor.assertions = Arc::new(assertions);
        self
    }

    /// Files under `search_path` whose names end with one of `suffixes`,
    /// sorted. A matching file path yields itself.
    pub fn discover(search_path: &Path, suffixes: &[String]) -> Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(search_path).map_err(|e| Error::SearchPath {
            path: search_path.display().to_string(),
            error: e.to_string(),
        })?;

        let mut found = Vec::new();
        if metadata.is_dir() {
            walk(search_path, suffixes, &mut found)?;
            found.sort();
        } else if has_suffix(search_path, suffixes) {
            found.push(search_path.to_path_buf());
        }
        Ok(found)
    }

    /// Read, parse and validate one definition file
    pub fn load_file(&self, path: &Path) -> Result<Definition> {
        let data = std::fs::read(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        self.decode(path, &data)
    }

    /// [`Runner::load_file`] without blocking the executor, used while
    /// definitions are already running
    pub async fn load_file_async(&self, path: &Path) -> Result<Definition> {
        let data = tokio::fs::read(path).await.map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        self.decode(path, &data)
    }

    fn decode(&self, path: &Path, data: &[u8]) -> Result<Definition> {
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut definition = self
            .parser
            .parse(data, &extension)
            .map_err(|e| Error::parse(&path.display().to_string(), e))?;
        definition.path = path.to_path_buf();
        definition.validate()?;
        Ok(definition)
    }

    /// Load every definition under `search_path`.
    ///
    /// Broken files are logged and skipped when scanning a directory, but
    /// abort the load when `search_path` names the file directly.
    pub fn load_definitions(&self, search_path: &Path, suffixes: &[String]) -> Result<Vec<Definition>> {
        let files = Self::discover(search_path, suffixes)?;

        let definitions = if search_path.is_dir() {
            tracing::debug!(
                path = %search_path.display(),
                ?suffixes,
                "Searching for test files"
            );
            files
                .iter()
                .filter_map(|file| match self.load_file(file) {
                    Ok(definition) => Some(definition),
                    Err(e) => {
                        tracing::error!(path = %file.display(), error = %e, "Error processing file");
                        None
                    }
                })
                .collect()
        } else {
            files
                .iter()
                .map(|file| self.load_file(file))
                .collect::<Result<Vec<_>>>()?
        };

        if definitions.is_empty() {
            tracing::info!(path = %search_path.display(), "No test definitions found");
        } else {
            tracing::info!(count = definitions.len(), "Found test definitions");
        }
        Ok(definitions)
    }

    /// Run every definition and collect results by definition name
    pub async fn execute(&self, definitions: Vec<Definition>) -> RunResults {
        let guard = HookGuard::new();
        let guard = &guard;

        let outcomes: Vec<(String, DefinitionResult)> = if self.concurrency > 1 {
            stream::iter(definitions)
                .map(move |definition| {
                    let name = definition.name.clone();
                    self.execute_definition(definition, guard)
                        .map(move |result| (name, result))
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await
        } else {
            let mut outcomes = Vec::with_capacity(definitions.len());
            for definition in definitions {
                let name = definition.name.clone();
                outcomes.push((name, self.execute_definition(definition, guard).await));
            }
            outcomes
        };

        outcomes.into_iter().collect()
    }

    /// Run one definition through its full lifecycle.
    ///
    /// A definition whose file already ran in this run yields an empty
    /// result.
    pub fn execute_definition<'a>(
        &'a self,
        definition: Definition,
        guard: &'a HookGuard,
    ) -> BoxFuture<'a, DefinitionResult> {
        async move {
            let mut definition = definition;
            let mut result = DefinitionResult::new(definition.path.clone());

            if !definition.path.as_os_str().is_empty() {
                let key = tokio::fs::canonicalize(&definition.path)
                    .await
                    .unwrap_or_else(|_| definition.path.clone());
                if !guard.enter(&key) {
                    tracing::warn!(
                        path = %definition.path.display(),
                        "Skipping already processed definition to prevent recursion"
                    );
                    return result;
                }
            }

            tracing::debug!(name = %definition.name, "Executing test definition");

            if !definition.before_all.is_empty() {
                let (exported, error) = self
                    .run_hooks(&definition.before_all, &definition.variables, guard)
                    .await;
                if let Some(e) = error {
                    tracing::error!(error = %e, "Error executing BeforeAll hooks");
                }
                definition.variables.extend(exported);
            }

            for suite in &definition.suites {
                let mut variables = definition.variables.clone();
                variables.extend(suite.variables.clone());

                if !definition.before_each.is_empty() {
                    let (exported, error) = self
                        .run_hooks(&definition.before_each, &variables, guard)
                        .await;
                    if let Some(e) = error {
                        tracing::error!(suite = %suite.name, error = %e, "Error executing BeforeEach hooks");
                    }
                    variables.extend(exported);
                }

                let suite_result = run_suite(&self.executor, suite, variables).await;

                if !definition.after_each.is_empty() {
                    let (_, error) = self
                        .run_hooks(&definition.after_each, &suite_result.variables, guard)
                        .await;
                    if let Some(e) = error {
                        tracing::error!(suite = %suite.name, error = %e, "Error executing AfterEach hooks");
                    }
                }

                result.suites.push(suite_result);
            }

            if !definition.after_all.is_empty() {
                let (_, error) = self
                    .run_hooks(&definition.after_all, &definition.variables, guard)
                    .await;
                if let Some(e) = error {
                    tracing::error!(error = %e, "Error executing AfterAll hooks");
                }
            }

            result
        }
        .boxed()
    }
}

fn has_suffix(path: &Path, suffixes: &[String]) -> bool {
    let name = path.to_string_lossy();
    suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}

fn walk(dir: &Path, suffixes: &[String], found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, suffixes, found)?;
        } else if has_suffix(&path, suffixes) {
            found.push(path);
        }
    }
    Ok(())
}
