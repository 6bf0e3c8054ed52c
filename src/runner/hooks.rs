//! Lifecycle hooks
//!
//! A hook is a full definition run for its side effects before or after
//! another definition's suites. Variables exported by a hook's suites flow
//! back into the caller's scope.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::Runner;
use crate::common::Error;
use crate::definition::Variables;

/// Definition files already executed in the current run.
///
/// Created fresh for every [`Runner::execute`] call and shared by reference
/// across concurrently running definitions.
#[derive(Debug, Default)]
pub struct HookGuard {
    visited: Mutex<HashSet<PathBuf>>,
}

impl HookGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as executed. Returns false when it already was.
    pub fn enter(&self, path: &Path) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }

    pub fn len(&self) -> usize {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Runner {
    /// Run `paths` in order as hooks and collect the variables they export.
    ///
    /// Already-executed paths are skipped with a warning. A hook that cannot
    /// be resolved or loaded stops the batch, and the variables collected so
    /// far are returned alongside the error.
    pub async fn run_hooks(
        &self,
        paths: &[String],
        inherited: &Variables,
        guard: &HookGuard,
    ) -> (Variables, Option<Error>) {
        let mut exported = Variables::new();

        for hook_path in paths {
            let path = match tokio::fs::canonicalize(hook_path).await {
                Ok(path) => path,
                Err(e) => {
                    let e = Error::FileRead {
                        path: hook_path.clone(),
                        error: e.to_string(),
                    };
                    return (exported, Some(Error::hook(hook_path, &e)));
                }
            };

            if guard.contains(&path) {
                tracing::warn!(
                    path = %path.display(),
                    "Skipping already processed hook to prevent recursion"
                );
                continue;
            }

            tracing::debug!(path = %path.display(), "Loading hook");
            let mut hook = match self.load_file_async(&path).await {
                Ok(hook) => hook,
                Err(e) => return (exported, Some(Error::hook(hook_path, &e))),
            };

            for (name, variable) in inherited {
                hook.variables
                    .entry(name.clone())
                    .or_insert_with(|| variable.clone());
            }

            tracing::debug!(name = %hook.name, path = %path.display(), "Executing hook");
            let result = self.execute_definition(hook, guard).await;
            for suite in result.suites {
                exported.extend(suite.variables);
            }
        }

        (exported, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Variable;
    use crate::runner::tests::runner;
    use std::fs;

    fn hook_file(dir: &Path, name: &str, variable: &str) -> String {
        let path = dir.join(name);
        fs::write(
            &path,
            format!(
                "name: {name}\nvariables:\n  {variable}: {{type: string, value: set}}\nsuites:\n  - name: s\n    cases: []\n"
            ),
        )
        .unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_guard_enter_once() {
        let guard = HookGuard::new();
        assert!(guard.is_empty());
        assert!(guard.enter(Path::new("/tmp/a.yaml")));
        assert!(!guard.enter(Path::new("/tmp/a.yaml")));
        assert!(guard.contains(Path::new("/tmp/a.yaml")));
        assert!(!guard.contains(Path::new("/tmp/b.yaml")));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn test_guard_shared_across_threads() {
        let guard = HookGuard::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| guard.enter(Path::new("/tmp/shared.yaml")));
            }
        });
        assert_eq!(guard.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_hook_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let first = hook_file(dir.path(), "first.yaml", "first");
        let missing = dir.path().join("missing.yaml").display().to_string();
        let third = hook_file(dir.path(), "third.yaml", "third");

        let guard = HookGuard::new();
        let (exported, error) = runner()
            .run_hooks(&[first, missing.clone(), third], &Variables::new(), &guard)
            .await;

        match error {
            Some(Error::Hook { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected hook error, got {:?}", other),
        }
        assert_eq!(exported["first"].value, "set");
        assert!(!exported.contains_key("third"));
        assert_eq!(guard.len(), 1);
    }

    #[tokio::test]
    async fn test_executed_hook_is_skipped_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let hook = hook_file(dir.path(), "once.yaml", "once");

        let guard = HookGuard::new();
        let runner = runner();
        let (first, _) = runner.run_hooks(&[hook.clone()], &Variables::new(), &guard).await;
        let (second, error) = runner.run_hooks(&[hook], &Variables::new(), &guard).await;

        assert!(first.contains_key("once"));
        assert!(second.is_empty());
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_inherited_variables_fill_only_absent_names() {
        let dir = tempfile::tempdir().unwrap();
        let hook = hook_file(dir.path(), "scoped.yaml", "shared");

        let inherited: Variables = [
            ("shared", "outer"),
            ("extra", "passed-down"),
        ]
        .into_iter()
        .map(|(k, v)| {
            (
                k.to_string(),
                Variable {
                    kind: "string".to_string(),
                    value: v.to_string(),
                },
            )
        })
        .collect();

        let (exported, error) = runner()
            .run_hooks(&[hook], &inherited, &HookGuard::new())
            .await;

        assert!(error.is_none());
        assert_eq!(exported["shared"].value, "set");
        assert_eq!(exported["extra"].value, "passed-down");
    }
}
