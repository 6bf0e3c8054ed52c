//! Environment snapshot feeding `${env:NAME}` tokens
//!
//! Interpolation never reads the live process environment. A snapshot is
//! taken once at startup, optionally overlaid with a dotenv-style file, and
//! shared read-only by every task.

use std::collections::HashMap;
use std::path::Path;

use crate::common::{Error, Result};

/// Immutable name to value map used for `${env:NAME}` lookups
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// An environment with no variables
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the current process environment
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    /// Overlay `KEY=VALUE` lines from a dotenv-style file.
    ///
    /// Values are taken literally: no `$VAR` expansion, no escapes. A missing
    /// file leaves the snapshot unchanged.
    pub fn with_file(mut self, path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "env file not found, skipping");
                return Ok(self);
            }
            Err(e) => {
                return Err(Error::EnvFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| Error::EnvFile {
                path: path.display().to_string(),
                message: format!("invalid format at line {}: {}", index + 1, line),
            })?;
            self.vars
                .insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }

        Ok(self)
    }

    /// Look up a variable; unset and empty values both count as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Strip one pair of matching surrounding quotes
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() > 1 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
