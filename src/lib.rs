//! httpprobe - declarative HTTP endpoint testing
//!
//! This library loads test definitions (suites of HTTP requests with
//! assertions, exports and lifecycle hooks), runs them with optional
//! concurrency and aggregates the results.

pub mod assertion;
pub mod cli;
pub mod commands;
pub mod common;
pub mod definition;
pub mod http;
pub mod interpolate;
pub mod jsonpath;
pub mod results;
pub mod runner;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use definition::{Definition, DefinitionParser, FormatParser};
pub use runner::{Runner, RunnerOptions};
