//! Assertion framework
//!
//! Assertions are built from the declarative `assertions` map of a request
//! through type-keyed factories, then validated against an
//! [`AssertionContext`] built from the response. Validation never
//! short-circuits: every failure is collected as a human-readable reason.

mod body;
mod expected;
mod header;
mod status;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::common::{Error, Result};
use crate::http::HttpResponse;

pub use body::{BodyAssertion, BodyAssertionFactory, Comparison};
pub use expected::ExpectedValue;
pub use header::{HeaderAssertion, HeaderAssertionFactory};
pub use status::{StatusAssertion, StatusAssertionFactory};

/// A single expectation about a response
pub trait Assertion: Send + Sync + fmt::Debug {
    /// Check the response; `Err` carries the failure reason
    fn validate(&self, ctx: &AssertionContext) -> std::result::Result<(), String>;
}

/// Creates assertions of one type from `(key, expected)` pairs
pub trait AssertionFactory: Send + Sync {
    fn create(&self, key: &str, expected: ExpectedValue) -> Result<Box<dyn Assertion>>;
}

/// Response data assertions are validated against
#[derive(Debug, Clone)]
pub struct AssertionContext {
    pub status: u16,
    /// First value of each header, keyed by lowercase name
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Decoded body; an empty object when the body is not JSON
    pub json: Value,
}

impl AssertionContext {
    pub fn new<'a>(
        status: u16,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
        body: &[u8],
    ) -> Self {
        let mut map = HashMap::new();
        for (name, value) in headers {
            map.entry(name.to_ascii_lowercase())
                .or_insert_with(|| value.to_string());
        }

        Self {
            status,
            headers: map,
            body: body.to_vec(),
            json: decode_body(body),
        }
    }

    pub fn from_response(response: &HttpResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, values)| {
                values
                    .first()
                    .map(|value| (name.to_ascii_lowercase(), value.clone()))
            })
            .collect();

        Self {
            status: response.status,
            headers,
            body: response.body.clone(),
            json: decode_body(&response.body),
        }
    }

    /// Header lookup by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn decode_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Factories keyed by assertion type
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, Box<dyn AssertionFactory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: Box<dyn AssertionFactory>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(&self, kind: &str, key: &str, expected: &Value) -> Result<Box<dyn Assertion>> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| Error::AssertionBuild(format!("unknown assertion type: {}", kind)))?;
        factory.create(key, ExpectedValue::from(expected))
    }
}

const STATUS: &str = "status";
const HEADERS: &str = "headers";
const BODY: &str = "body";

/// Builds assertion lists from request `assertions` maps
pub struct AssertionBuilder {
    registry: Registry,
}

impl Default for AssertionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssertionBuilder {
    /// Builder with the status, headers and body factories registered
    pub fn new() -> Self {
        let mut registry = Registry::new();
        registry.register(STATUS, Box::new(StatusAssertionFactory));
        registry.register(HEADERS, Box::new(HeaderAssertionFactory));
        registry.register(BODY, Box::new(BodyAssertionFactory));
        Self { registry }
    }

    /// Add or replace an assertion type
    pub fn register_type(&mut self, name: &str, factory: Box<dyn AssertionFactory>) {
        self.registry.register(name, factory);
    }

    /// Build the ordered assertion list: status, then headers, then body,
    /// then any other registered types. Order within a group follows the
    /// map and must not be relied upon.
    pub fn build(&self, data: &Map<String, Value>) -> Result<Vec<Box<dyn Assertion>>> {
        let mut assertions = Vec::new();

        if let Some(status) = data.get(STATUS) {
            assertions.push(self.registry.create(STATUS, "", status)?);
        }

        for group in [HEADERS, BODY] {
            if let Some(spec) = data.get(group) {
                let entries = spec.as_object().ok_or_else(|| {
                    Error::AssertionBuild(format!("'{}' assertions must be a map", group))
                })?;
                for (key, expected) in entries {
                    assertions.push(self.registry.create(group, key, expected)?);
                }
            }
        }

        for (kind, spec) in data {
            if matches!(kind.as_str(), STATUS | HEADERS | BODY) {
                continue;
            }
            match spec {
                Value::Object(entries) if self.registry.contains(kind) => {
                    for (key, expected) in entries {
                        assertions.push(self.registry.create(kind, key, expected)?);
                    }
                }
                other => assertions.push(self.registry.create(kind, "", other)?),
            }
        }

        Ok(assertions)
    }
}

/// Run every assertion and collect every failure reason
pub fn validate_all(assertions: &[Box<dyn Assertion>], ctx: &AssertionContext) -> Vec<String> {
    assertions
        .iter()
        .filter_map(|assertion| assertion.validate(ctx).err())
        .collect()
}
