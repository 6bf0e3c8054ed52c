//! Test definition object model
//!
//! Defines the data structures deserialized from YAML or JSON definition
//! files: a definition holds suites, a suite holds cases, and a case holds a
//! single request with its assertions and exports.

mod parser;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::common::{Error, Result};

pub use parser::{DefinitionParser, FormatParser};

/// Variables visible to a scope, keyed by name
pub type Variables = HashMap<String, Variable>;

/// A complete test definition loaded from one file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Definition {
    /// File the definition was loaded from (empty for in-memory definitions)
    #[serde(skip)]
    pub path: PathBuf,
    /// Identifier used in logs and reports
    #[serde(default)]
    pub name: String,
    /// Optional description of what the definition covers
    #[serde(default)]
    pub description: String,
    /// Variables shared by every suite
    #[serde(default)]
    pub variables: Variables,
    /// Definitions executed once before any suite runs
    #[serde(default)]
    pub before_all: Vec<String>,
    /// Definitions executed once after every suite has run
    #[serde(default)]
    pub after_all: Vec<String>,
    /// Definitions executed before each suite
    #[serde(default)]
    pub before_each: Vec<String>,
    /// Definitions executed after each suite
    #[serde(default)]
    pub after_each: Vec<String>,
    /// Suites, executed in declared order
    #[serde(default)]
    pub suites: Vec<Suite>,
}

impl Definition {
    /// Check the structural requirements that must hold before execution
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Validation(
                "test definition name is required".to_string(),
            ));
        }

        if self.suites.is_empty() {
            return Err(Error::Validation(
                "test definition must have at least one suite".to_string(),
            ));
        }

        if self.suites.iter().any(|suite| suite.name.is_empty()) {
            return Err(Error::Validation("suite name is required".to_string()));
        }

        Ok(())
    }
}

/// A single variable. Values are always textual.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    #[serde(rename = "type", default = "default_variable_type")]
    pub kind: String,
    #[serde(default, deserialize_with = "textual")]
    pub value: String,
}

impl Variable {
    /// Create a string variable
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: default_variable_type(),
            value: value.into(),
        }
    }
}

fn default_variable_type() -> String {
    "string".to_string()
}

/// A named group of cases sharing a variable scope
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Suite {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cases: Vec<Case>,
    /// Overlay on top of the definition variables
    #[serde(default)]
    pub variables: Variables,
    /// Free-form suite options
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Suite {
    /// Whether cases in this suite run concurrently (`config.concurrent: true`)
    pub fn is_concurrent(&self) -> bool {
        self.config
            .get("concurrent")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One request and what is expected of its response
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Case {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub request: Request,
}

/// An HTTP request with its assertions and exports
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Request {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub url: String,
    /// Ordered headers; duplicate keys are allowed
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: RequestBody,
    /// Assertion type (`status`, `headers`, `body`) to its expectations
    #[serde(default)]
    pub assertions: Map<String, Value>,
    #[serde(default)]
    pub export: RequestExport,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    #[serde(default, deserialize_with = "textual")]
    pub value: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RequestBody {
    /// Body encoding; only `json` bodies are interpolated
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RequestBody {
    pub fn is_json(&self) -> bool {
        self.kind.eq_ignore_ascii_case("json")
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RequestExport {
    /// Values extracted from the response body
    #[serde(default)]
    pub body: Vec<BodyExport>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BodyExport {
    /// JSONPath into the response body
    #[serde(default)]
    pub path: String,
    /// Variable the extracted value is stored under
    #[serde(rename = "as", default)]
    pub variable_name: String,
}

/// Render a decoded value as variable text.
///
/// Strings are stored raw, numbers in their shortest form, null as the
/// empty string, and arrays/objects as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        complex => complex.to_string(),
    }
}

/// Accept any scalar where a string is expected (`value: 5` becomes "5")
fn textual<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Definition {
        Definition {
            name: "users".to_string(),
            suites: vec![Suite {
                name: "list".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_minimal_definition() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_name() {
        let mut def = minimal();
        def.name.clear();
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("name is required"));
    }

    #[test]
    fn test_validate_requires_suites() {
        let mut def = minimal();
        def.suites.clear();
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("at least one suite"));
    }

    #[test]
    fn test_validate_requires_suite_names() {
        let mut def = minimal();
        def.suites.push(Suite::default());
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("suite name is required"));
    }

    #[test]
    fn test_suite_concurrency_flag() {
        let mut suite = Suite::default();
        assert!(!suite.is_concurrent());

        suite.config.insert("concurrent".to_string(), json!(true));
        assert!(suite.is_concurrent());

        suite.config.insert("concurrent".to_string(), json!("yes"));
        assert!(!suite.is_concurrent());
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("abc")), "abc");
        assert_eq!(value_to_text(&json!(42)), "42");
        assert_eq!(value_to_text(&json!(1.5)), "1.5");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&json!(null)), "");
        assert_eq!(value_to_text(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
    }
}
