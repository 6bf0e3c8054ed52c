//! Response body assertions addressed by JSONPath
//!
//! The expected value may start with a comparison token:
//!
//! ```yaml
//! body:
//!   $.name: alice          # strict equality
//!   $.count: "> 10"        # numeric comparison
//!   $.message: contains ok # substring
//!   $.status: "!= failed"
//! ```

use serde_json::Value;
use std::fmt;

use super::expected::display_value;
use super::{Assertion, AssertionContext, AssertionFactory, ExpectedValue};
use crate::common::{Error, Result};
use crate::jsonpath::JsonPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// No token: strict equality on the decoded value
    Strict,
    Equals,
    NotEquals,
    Contains,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

/// Tokens in match order; longer tokens come before their prefixes
const TOKENS: &[(&str, Comparison)] = &[
    ("contains", Comparison::Contains),
    ("==", Comparison::Equals),
    ("!=", Comparison::NotEquals),
    (">=", Comparison::GreaterOrEqual),
    ("<=", Comparison::LessOrEqual),
    ("=", Comparison::Equals),
    (">", Comparison::Greater),
    ("<", Comparison::Less),
];

impl Comparison {
    /// Split a leading comparison token off an expected string.
    ///
    /// Returns `None` when there is no token or nothing follows it.
    pub fn parse(expected: &str) -> Option<(Comparison, &str)> {
        let trimmed = expected.trim_start();
        TOKENS.iter().find_map(|(token, comparison)| {
            let rest = trimmed.strip_prefix(token)?.trim();
            (!rest.is_empty()).then_some((*comparison, rest))
        })
    }

    fn holds(self, a: f64, b: f64) -> bool {
        match self {
            Comparison::Greater => a > b,
            Comparison::GreaterOrEqual => a >= b,
            Comparison::Less => a < b,
            Comparison::LessOrEqual => a <= b,
            Comparison::Strict | Comparison::Equals | Comparison::NotEquals | Comparison::Contains => {
                false
            }
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Comparison::Strict | Comparison::Equals => "==",
            Comparison::NotEquals => "!=",
            Comparison::Contains => "contains",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
        };
        f.write_str(token)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyAssertion {
    pub path: String,
    pub expected: ExpectedValue,
    pub comparison: Comparison,
}

impl BodyAssertion {
    /// Create a body assertion. `contains` needs a string operand.
    pub fn new(path: &str, comparison: Comparison, expected: ExpectedValue) -> Result<Self> {
        if comparison == Comparison::Contains && !matches!(expected, ExpectedValue::String(_)) {
            return Err(Error::AssertionBuild(format!(
                "'contains' comparison requires string value, got {}",
                expected.type_name()
            )));
        }

        Ok(Self {
            path: path.to_string(),
            expected,
            comparison,
        })
    }

    fn compare(&self, actual: &Value) -> std::result::Result<(), String> {
        match self.comparison {
            Comparison::Strict => {
                if !self.expected.matches(actual) {
                    return Err(format!(
                        "expected '{}', got '{}'",
                        self.expected,
                        display_value(actual)
                    ));
                }
            }
            Comparison::Equals | Comparison::NotEquals => {
                let expected = self.expected.to_string();
                let equal = loose_eq(actual, &expected);
                if equal != (self.comparison == Comparison::Equals) {
                    return Err(format!(
                        "expected value {} '{}', got '{}'",
                        self.comparison,
                        expected,
                        display_value(actual)
                    ));
                }
            }
            Comparison::Contains => {
                let Value::String(haystack) = actual else {
                    return Err(format!(
                        "'contains' comparison requires string value, got {}",
                        json_type(actual)
                    ));
                };
                let needle = self.expected.to_string();
                if !haystack.contains(&needle) {
                    return Err(format!("expected '{}' to contain '{}'", haystack, needle));
                }
            }
            comparison @ (Comparison::Greater
            | Comparison::GreaterOrEqual
            | Comparison::Less
            | Comparison::LessOrEqual) => {
                let a = actual_number(actual)?;
                let b = expected_number(&self.expected)?;
                if !comparison.holds(a, b) {
                    return Err(format!(
                        "comparison failed: {} {} {}",
                        display_value(actual),
                        comparison,
                        self.expected
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Assertion for BodyAssertion {
    fn validate(&self, ctx: &AssertionContext) -> std::result::Result<(), String> {
        let path = JsonPath::parse(&self.path).map_err(|e| e.to_string())?;
        let actual = path
            .find(&ctx.json)
            .ok_or_else(|| format!("JSONPath '{}' not found in response body", self.path))?;
        self.compare(&actual)
    }
}

/// Equality for tokenized expectations, where the expected side is text
fn loose_eq(actual: &Value, expected: &str) -> bool {
    match actual {
        Value::String(s) => s == expected,
        Value::Number(n) => match (n.as_f64(), expected.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        Value::Bool(b) => b.to_string() == expected,
        Value::Null => expected == "null",
        complex => complex.to_string() == expected,
    }
}

fn actual_number(value: &Value) -> std::result::Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("cannot convert actual value '{}' to number", n)),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("cannot convert actual value '{}' to number", s)),
        other => Err(format!("expected numeric value, got {}", json_type(other))),
    }
}

fn expected_number(value: &ExpectedValue) -> std::result::Result<f64, String> {
    match value {
        ExpectedValue::Number(n) => Ok(*n),
        ExpectedValue::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("cannot convert expected value '{}' to number", s)),
        other => Err(format!("expected numeric value, got {}", other.type_name())),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds [`BodyAssertion`]s keyed by JSONPath
pub struct BodyAssertionFactory;

impl AssertionFactory for BodyAssertionFactory {
    fn create(&self, key: &str, expected: ExpectedValue) -> Result<Box<dyn Assertion>> {
        let (comparison, expected) = match &expected {
            ExpectedValue::String(s) => match Comparison::parse(s) {
                Some((comparison, rest)) => {
                    (comparison, ExpectedValue::String(rest.to_string()))
                }
                None => (Comparison::Strict, expected),
            },
            _ => (Comparison::Strict, expected),
        };

        Ok(Box::new(BodyAssertion::new(key, comparison, expected)?))
    }
}
