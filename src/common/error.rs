//! Error types for httpprobe
//!
//! Failed assertions are not errors: they are collected as failure reasons on
//! the case result. The variants here cover everything that stops a file, a
//! definition or a single case from being executed at all.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for httpprobe
#[derive(Error, Debug)]
pub enum Error {
    // === Loading Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Unsupported file extension: '{0}'. Supported: .yaml, .yml, .json")]
    UnsupportedExtension(String),

    #[error("Error decoding {format}: {message}")]
    Decode { format: &'static str, message: String },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Invalid test definition: {0}")]
    Validation(String),

    #[error("Error accessing search path '{path}': {error}")]
    SearchPath { path: String, error: String },

    // === Case Execution Errors ===
    #[error("Error interpolating variables: {0}")]
    Interpolation(String),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Error executing request: {0}")]
    Transport(String),

    #[error("Failed to build assertions: {0}")]
    AssertionBuild(String),

    #[error("Invalid JSONPath '{path}': {message}")]
    JsonPath { path: String, message: String },

    // === Hook Errors ===
    #[error("Error running hook '{path}': {message}")]
    Hook { path: String, message: String },

    // === Environment Errors ===
    #[error("Invalid env file '{path}': {message}")]
    EnvFile { path: String, message: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error for the given file
    pub fn parse<S: ToString>(path: &str, message: S) -> Self {
        Self::Parse {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a JSONPath error
    pub fn json_path(path: &str, message: &str) -> Self {
        Self::JsonPath {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a hook error wrapping the underlying failure
    pub fn hook(path: &str, source: &Error) -> Self {
        Self::Hook {
            path: path.to_string(),
            message: source.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_error_carries_source_message() {
        let inner = Error::Validation("test definition name is required".to_string());
        let err = Error::hook("hooks/login.yaml", &inner);
        assert_eq!(
            err.to_string(),
            "Error running hook 'hooks/login.yaml': Invalid test definition: test definition name is required"
        );
    }

    #[test]
    fn test_unsupported_extension_message() {
        let err = Error::UnsupportedExtension(".txt".to_string());
        assert!(err.to_string().contains(".txt"));
    }
}
