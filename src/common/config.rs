//! Configuration file handling

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Defaults for the `run` command
    #[serde(default)]
    pub run: RunConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Defaults for the `run` command, overridable from the command line
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Number of definitions executed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Accepted definition file suffixes
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Result format: text, table or json
    #[serde(default = "default_output")]
    pub output: String,

    /// Optional dotenv-style file seeding `${env:NAME}` tokens
    #[serde(default)]
    pub env_file: Option<PathBuf>,

    /// Where the json writer puts its report
    #[serde(default = "default_json_output_path")]
    pub json_output_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            include: default_include(),
            output: default_output(),
            env_file: None,
            json_output_path: default_json_output_path(),
        }
    }
}

fn default_concurrency() -> usize {
    2
}
fn default_include() -> Vec<String> {
    vec![".yaml".to_string(), ".json".to_string()]
}
fn default_output() -> String {
    "text".to_string()
}
fn default_json_output_path() -> PathBuf {
    PathBuf::from("test-results.json")
}

/// HTTP client settings
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Base URL that relative request URLs are joined to
    #[serde(default)]
    pub base_url: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            base_url: None,
            headers: BTreeMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
