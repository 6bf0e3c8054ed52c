//! Definition file decoding
//!
//! YAML and JSON map onto the identical schema; the format is chosen by the
//! file extension.

use super::Definition;
use crate::common::{Error, Result};

/// Turns raw file contents into a [`Definition`]
pub trait DefinitionParser: Send + Sync {
    /// Parse `data` using the format selected by `extension` (e.g. `.yaml`)
    fn parse(&self, data: &[u8], extension: &str) -> Result<Definition>;
}

/// Parser selecting YAML or JSON by extension
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatParser;

impl FormatParser {
    fn parse_yaml(data: &[u8]) -> Result<Definition> {
        serde_yaml::from_slice(data).map_err(|e| Error::Decode {
            format: "YAML",
            message: e.to_string(),
        })
    }

    fn parse_json(data: &[u8]) -> Result<Definition> {
        serde_json::from_slice(data).map_err(|e| Error::Decode {
            format: "JSON",
            message: e.to_string(),
        })
    }
}

impl DefinitionParser for FormatParser {
    fn parse(&self, data: &[u8], extension: &str) -> Result<Definition> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Self::parse_yaml(data),
            "json" => Self::parse_json(data),
            _ => Err(Error::UnsupportedExtension(extension.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YAML: &str = r#"
name: auth
description: Login flow
variables:
  base_url:
    type: string
    value: http://localhost:8080
  retries:
    type: int
    value: 3
before_all:
  - hooks/seed.yaml
suites:
  - name: login
    config:
      concurrent: true
    variables:
      user:
        type: string
        value: alice
    cases:
      - title: Obtain token
        request:
          method: POST
          url: ${base_url}/login
          headers:
            - key: Content-Type
              value: application/json
            - key: X-Trace
              value: a
            - key: X-Trace
              value: b
          body:
            type: json
            data:
              user: ${user}
          assertions:
            status: 200
            headers:
              Content-Type: application/json
            body:
              $.token: "!= "
          export:
            body:
              - path: $.token
                as: access_token
"#;

    #[test]
    fn test_parse_yaml_definition() {
        let def = FormatParser.parse(YAML.as_bytes(), ".yaml").unwrap();
        assert_eq!(def.name, "auth");
        assert_eq!(def.variables["retries"].value, "3");
        assert_eq!(def.variables["retries"].kind, "int");
        assert_eq!(def.before_all, vec!["hooks/seed.yaml"]);

        let suite = &def.suites[0];
        assert!(suite.is_concurrent());
        assert_eq!(suite.variables["user"].value, "alice");

        let request = &suite.cases[0].request;
        assert_eq!(request.method, "POST");
        assert_eq!(request.headers.len(), 3);
        assert_eq!(request.headers[2].value, "b");
        assert!(request.body.is_json());
        assert_eq!(request.body.data, Some(json!({"user": "${user}"})));
        assert_eq!(request.assertions["status"], json!(200));
        assert_eq!(request.export.body[0].variable_name, "access_token");
    }

    #[test]
    fn test_parse_json_definition() {
        let data = json!({
            "name": "health",
            "suites": [{
                "name": "ping",
                "cases": [{
                    "title": "status",
                    "request": {
                        "method": "GET",
                        "url": "http://localhost/status/200",
                        "assertions": {"status": 200}
                    }
                }]
            }]
        });

        let def = FormatParser
            .parse(data.to_string().as_bytes(), ".json")
            .unwrap();
        assert_eq!(def.name, "health");
        assert_eq!(def.suites[0].cases[0].title, "status");
        assert!(!def.suites[0].is_concurrent());
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let err = FormatParser.parse(b"name: x", ".toml").unwrap_err();
        assert!(matches!(err, Error::UnsupportedExtension(ext) if ext == ".toml"));
    }

    #[test]
    fn test_parse_reports_malformed_yaml() {
        let err = FormatParser.parse(b"name: [unclosed", ".yaml").unwrap_err();
        assert!(err.to_string().starts_with("Error decoding YAML"));
    }
}
