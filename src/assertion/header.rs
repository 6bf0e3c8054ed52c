//! Response header assertions

use super::{Assertion, AssertionContext, AssertionFactory, ExpectedValue};
use crate::common::{Error, Result};

/// Compares one header value after trimming surrounding whitespace.
/// The value comparison is case-sensitive; the name lookup is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderAssertion {
    pub name: String,
    pub expected: String,
}

impl Assertion for HeaderAssertion {
    fn validate(&self, ctx: &AssertionContext) -> std::result::Result<(), String> {
        let actual = ctx
            .header(&self.name)
            .ok_or_else(|| format!("header '{}' not found in response", self.name))?;

        if actual.trim() != self.expected.trim() {
            return Err(format!(
                "expected header '{}' to be '{}', got '{}'",
                self.name, self.expected, actual
            ));
        }
        Ok(())
    }
}

/// Builds [`HeaderAssertion`]s keyed by header name
pub struct HeaderAssertionFactory;

impl AssertionFactory for HeaderAssertionFactory {
    fn create(&self, key: &str, expected: ExpectedValue) -> Result<Box<dyn Assertion>> {
        let expected = match expected {
            ExpectedValue::String(s) => s,
            ExpectedValue::Number(_) | ExpectedValue::Bool(_) => expected.to_string(),
            other => {
                return Err(Error::AssertionBuild(format!(
                    "header value must be convertible to string, got {}",
                    other.type_name()
                )))
            }
        };

        Ok(Box::new(HeaderAssertion {
            name: key.to_string(),
            expected,
        }))
    }
}
