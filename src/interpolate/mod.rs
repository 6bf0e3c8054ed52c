//! Variable interpolation engine
//!
//! Resolves `${...}` tokens in a single left-to-right scan. Each token is
//! tried, in order, as a function call (`${random(8)}`), a declared variable
//! (`${name}`) and an environment lookup (`${env:NAME}`). Tokens that resolve
//! to nothing are left in the output verbatim. Substituted text is not
//! scanned again.

pub mod env;
mod functions;

use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::definition::{Request, Variables};

pub use env::Environment;

const TOKEN_OPEN: &str = "${";
const ENV_PREFIX: &str = "env:";

/// Substitute every recognised token in `text`
pub fn interpolate(text: &str, variables: &Variables, env: &Environment) -> String {
    if !text.contains(TOKEN_OPEN) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(TOKEN_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + TOKEN_OPEN.len()..];

        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let token = &after[..end];
        if token.contains(TOKEN_OPEN) {
            // An inner token starts before this one closes; retry from there
            out.push_str(TOKEN_OPEN);
            rest = after;
            continue;
        }

        match resolve(token, variables, env) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + TOKEN_OPEN.len() + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn resolve(token: &str, variables: &Variables, env: &Environment) -> Option<String> {
    functions::parse_call(token)
        .and_then(|(name, args)| functions::call(name, &args))
        .or_else(|| variables.get(token).map(|v| v.value.clone()))
        .or_else(|| {
            token
                .strip_prefix(ENV_PREFIX)
                .and_then(|name| env.get(name))
                .map(str::to_string)
        })
}

/// Recursively interpolate a structured value.
///
/// Map keys and values are both interpolated and insertion order is kept.
/// Numbers, booleans and null pass through unchanged.
pub fn interpolate_value(value: &Value, variables: &Variables, env: &Environment) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate(s, variables, env)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| interpolate_value(item, variables, env))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    (
                        interpolate(k, variables, env),
                        interpolate_value(v, variables, env),
                    )
                })
                .collect::<Map<String, Value>>(),
        ),
        scalar => scalar.clone(),
    }
}

/// Produce an interpolated copy of a request: URL, header keys and values,
/// and the body when it is a JSON body.
pub fn interpolate_request(
    request: &Request,
    variables: &Variables,
    env: &Environment,
) -> Request {
    let mut out = request.clone();

    out.url = interpolate(&request.url, variables, env);

    for header in &mut out.headers {
        header.key = interpolate(&header.key, variables, env);
        header.value = interpolate(&header.value, variables, env);
    }

    if out.body.is_json() {
        out.body.data = request.body.data.as_ref().map(|data| match data {
            Value::String(s) => Value::String(interpolate(s, variables, env)),
            structured => interpolate_value(structured, variables, env),
        });
    }

    out
}

/// Decode an interpolated JSON text body into a structured value.
///
/// Used when the body string must be re-encoded; fails if interpolation
/// produced text that is no longer valid JSON.
pub fn reencode_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::Interpolation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Header, RequestBody, Variable};
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Variable::string(*v)))
            .collect()
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let env = Environment::empty();
        let variables = vars(&[("name", "John")]);
        for input in ["", "hello world", "$ {name}", "{name}", "$name", "100% ${", "}{"] {
            assert_eq!(interpolate(input, &variables, &env), input);
        }
    }

    #[test]
    fn test_declared_variables() {
        let env = Environment::empty();
        let variables = vars(&[("name", "John"), ("api_url", "https://api.example.com")]);

        assert_eq!(interpolate("Hello, ${name}!", &variables, &env), "Hello, John!");
        assert_eq!(
            interpolate("${api_url}/users/${name}", &variables, &env),
            "https://api.example.com/users/John"
        );
        assert_eq!(interpolate("${unknown}", &variables, &env), "${unknown}");
    }

    #[test]
    fn test_env_tokens() {
        let variables = Variables::new();

        let unset = Environment::empty();
        assert_eq!(interpolate("${env:X}", &variables, &unset), "${env:X}");

        let set: Environment = [("X", "5")].into_iter().collect();
        assert_eq!(interpolate("${env:X}", &variables, &set), "5");
        assert_eq!(interpolate("n=${env:X}${env:Y}", &variables, &set), "n=5${env:Y}");
    }

    #[test]
    fn test_random_function() {
        let env = Environment::empty();
        let variables = Variables::new();

        let first = interpolate("${random(5)}", &variables, &env);
        let second = interpolate("${random(5)}", &variables, &env);
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
        assert_ne!(first, "${random(5)}");
        assert_ne!(first, second);

        assert_eq!(interpolate("${random()}", &variables, &env).len(), 10);
        assert_eq!(interpolate("${random(oops)}", &variables, &env).len(), 10);
    }

    #[test]
    fn test_timestamp_and_unknown_functions() {
        let env = Environment::empty();
        let variables = Variables::new();

        let year = interpolate("${timestamp(%Y)}", &variables, &env);
        assert_eq!(year.len(), 4);
        assert_eq!(interpolate("${uuid()}", &variables, &env), "${uuid()}");
    }

    #[test]
    fn test_functions_resolve_before_variables() {
        let env = Environment::empty();
        let variables = vars(&[("random(3)", "shadowed")]);
        assert_eq!(interpolate("${random(3)}", &variables, &env).len(), 3);
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let env = Environment::empty();
        let variables = vars(&[("a", "${b}"), ("b", "nope")]);
        assert_eq!(interpolate("${a}", &variables, &env), "${b}");
    }

    #[test]
    fn test_nested_open_retries_inner_token() {
        let env = Environment::empty();
        let variables = vars(&[("b", "x")]);
        assert_eq!(interpolate("${a${b}", &variables, &env), "${ax");
    }

    #[test]
    fn test_interpolate_value_recurses() {
        let env: Environment = [("TOKEN", "t0k")].into_iter().collect();
        let variables = vars(&[("key", "user"), ("name", "John")]);

        let value = json!({
            "${key}": "${name}",
            "auth": ["Bearer ${env:TOKEN}", 42, true, null],
            "count": 3
        });

        let out = interpolate_value(&value, &variables, &env);
        assert_eq!(
            out,
            json!({
                "user": "John",
                "auth": ["Bearer t0k", 42, true, null],
                "count": 3
            })
        );
    }

    #[test]
    fn test_interpolate_request() {
        let env = Environment::empty();
        let variables = vars(&[("host", "localhost"), ("token", "abc")]);

        let request = Request {
            method: "POST".to_string(),
            url: "http://${host}/login".to_string(),
            headers: vec![Header {
                key: "Authorization".to_string(),
                value: "Bearer ${token}".to_string(),
            }],
            body: RequestBody {
                kind: "json".to_string(),
                data: Some(Value::String(r#"{"token": "${token}"}"#.to_string())),
            },
            ..Default::default()
        };

        let out = interpolate_request(&request, &variables, &env);
        assert_eq!(out.url, "http://localhost/login");
        assert_eq!(out.headers[0].value, "Bearer abc");
        assert_eq!(
            out.body.data,
            Some(Value::String(r#"{"token": "abc"}"#.to_string()))
        );
        // The source request is untouched
        assert_eq!(request.url, "http://${host}/login");
    }

    #[test]
    fn test_non_json_body_is_not_interpolated() {
        let env = Environment::empty();
        let variables = vars(&[("token", "abc")]);

        let request = Request {
            body: RequestBody {
                kind: "text".to_string(),
                data: Some(Value::String("${token}".to_string())),
            },
            ..Default::default()
        };

        let out = interpolate_request(&request, &variables, &env);
        assert_eq!(out.body.data, Some(Value::String("${token}".to_string())));
    }

    #[test]
    fn test_reencode_json() {
        assert_eq!(reencode_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert!(matches!(
            reencode_json("{broken"),
            Err(Error::Interpolation(_))
        ));
    }
}
