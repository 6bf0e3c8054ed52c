//! Tagged expected values
//!
//! Assertion data arrives as free-form YAML/JSON. Converting it to
//! [`ExpectedValue`] up front lets each validator match on the variants it
//! accepts instead of probing runtime types.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedValue {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    /// Arrays and objects, compared structurally
    Complex(Value),
}

impl ExpectedValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ExpectedValue::String(_) => "string",
            ExpectedValue::Number(_) => "number",
            ExpectedValue::Bool(_) => "bool",
            ExpectedValue::Null => "null",
            ExpectedValue::Complex(_) => "complex",
        }
    }

    /// Strict equality against a decoded value. Numbers compare as f64.
    pub fn matches(&self, actual: &Value) -> bool {
        match (self, actual) {
            (ExpectedValue::String(e), Value::String(a)) => e == a,
            (ExpectedValue::Number(e), Value::Number(a)) => a.as_f64() == Some(*e),
            (ExpectedValue::Bool(e), Value::Bool(a)) => e == a,
            (ExpectedValue::Null, Value::Null) => true,
            (ExpectedValue::Complex(e), a) => json_eq(e, a),
            _ => false,
        }
    }
}

impl From<&Value> for ExpectedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => ExpectedValue::String(s.clone()),
            Value::Number(n) => n
                .as_f64()
                .map(ExpectedValue::Number)
                .unwrap_or_else(|| ExpectedValue::Complex(value.clone())),
            Value::Bool(b) => ExpectedValue::Bool(*b),
            Value::Null => ExpectedValue::Null,
            complex => ExpectedValue::Complex(complex.clone()),
        }
    }
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedValue::String(s) => write!(f, "{}", s),
            ExpectedValue::Number(n) => write!(f, "{}", n),
            ExpectedValue::Bool(b) => write!(f, "{}", b),
            ExpectedValue::Null => write!(f, "null"),
            ExpectedValue::Complex(v) => write!(f, "{}", v),
        }
    }
}

/// Structural equality where numbers compare by value (`1 == 1.0`)
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| json_eq(v, other)))
        }
        _ => a == b,
    }
}

/// Render a decoded value the way failure messages show it
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        assert_eq!(ExpectedValue::from(&json!("a")), ExpectedValue::String("a".into()));
        assert_eq!(ExpectedValue::from(&json!(200)), ExpectedValue::Number(200.0));
        assert_eq!(ExpectedValue::from(&json!(false)), ExpectedValue::Bool(false));
        assert_eq!(ExpectedValue::from(&json!(null)), ExpectedValue::Null);
        assert_eq!(
            ExpectedValue::from(&json!([1, 2])),
            ExpectedValue::Complex(json!([1, 2]))
        );
    }

    #[test]
    fn test_strict_matching() {
        assert!(ExpectedValue::Number(25.0).matches(&json!(25)));
        assert!(ExpectedValue::Number(25.0).matches(&json!(25.0)));
        assert!(!ExpectedValue::Number(25.0).matches(&json!("25")));
        assert!(!ExpectedValue::String("25".into()).matches(&json!(25)));
        assert!(ExpectedValue::Complex(json!({"a": [1, 2.0]})).matches(&json!({"a": [1.0, 2]})));
        assert!(!ExpectedValue::Complex(json!({"a": 1})).matches(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_display() {
        assert_eq!(ExpectedValue::Number(10.0).to_string(), "10");
        assert_eq!(ExpectedValue::Number(2.5).to_string(), "2.5");
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(5)), "5");
    }
}
