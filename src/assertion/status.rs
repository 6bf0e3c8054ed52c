//! Status code assertions

use super::{Assertion, AssertionContext, AssertionFactory, ExpectedValue};
use crate::common::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusAssertion {
    pub expected: i64,
}

impl Assertion for StatusAssertion {
    fn validate(&self, ctx: &AssertionContext) -> std::result::Result<(), String> {
        if i64::from(ctx.status) != self.expected {
            return Err(format!(
                "expected status code {}, got {}",
                self.expected, ctx.status
            ));
        }
        Ok(())
    }
}

/// Builds [`StatusAssertion`]s; the key is ignored
pub struct StatusAssertionFactory;

impl AssertionFactory for StatusAssertionFactory {
    fn create(&self, _key: &str, expected: ExpectedValue) -> Result<Box<dyn Assertion>> {
        match expected {
            // Decoded floats (`200.0`) are truncated to an integer code
            ExpectedValue::Number(n) => Ok(Box::new(StatusAssertion {
                expected: n.trunc() as i64,
            })),
            other => Err(Error::AssertionBuild(format!(
                "status code must be an integer, got {}",
                other.type_name()
            ))),
        }
    }
}
