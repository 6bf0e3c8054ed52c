//! reqwest-backed [`HttpClient`]

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::{HttpClient, HttpResponse, Method, RequestParams};
use crate::common::{Error, Result};

/// Client-level settings applied to every request
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Prefix for request URLs that are not absolute
    pub base_url: Option<String>,
    pub timeout: Duration,
    /// Sent unless the request sets a header of the same name
    pub headers: Vec<(String, String)>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }
}

pub struct ReqwestClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ReqwestClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let defaults = header_map(&options.headers)
            .map_err(|e| Error::Config(format!("invalid default header: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .default_headers(defaults)
            .build()?;

        Ok(Self {
            client,
            base_url: options.base_url.filter(|base| !base.trim().is_empty()),
        })
    }

    fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !is_absolute(url) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            _ => url.to_string(),
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse> {
        let url = self.resolve_url(url);
        tracing::debug!(%method, %url, "Sending request");

        let headers = header_map(&params.headers).map_err(Error::Transport)?;
        let mut builder = self
            .client
            .request(method.into(), &url)
            .headers(headers);

        if !params.query.is_empty() {
            builder = builder.query(&params.query);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let body = response.bytes().await?.to_vec();
        tracing::debug!(status, bytes = body.len(), "Received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, params: &RequestParams) -> Result<HttpResponse> {
        self.send(Method::Get, url, None, params).await
    }

    async fn post(
        &self,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse> {
        self.send(Method::Post, url, body, params).await
    }

    async fn put(
        &self,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse> {
        self.send(Method::Put, url, body, params).await
    }

    async fn delete(&self, url: &str, params: &RequestParams) -> Result<HttpResponse> {
        self.send(Method::Delete, url, None, params).await
    }

    async fn patch(
        &self,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse> {
        self.send(Method::Patch, url, body, params).await
    }

    async fn head(&self, url: &str, params: &RequestParams) -> Result<HttpResponse> {
        self.send(Method::Head, url, None, params).await
    }

    async fn options(&self, url: &str, params: &RequestParams) -> Result<HttpResponse> {
        self.send(Method::Options, url, None, params).await
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Build a header map, keeping repeated names as repeated values
fn header_map(pairs: &[(String, String)]) -> std::result::Result<HeaderMap, String> {
    let mut map = HeaderMap::new();
    for (key, value) in pairs {
        let name = HeaderName::from_bytes(key.trim().as_bytes())
            .map_err(|e| format!("invalid header name '{}': {}", key, e))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| format!("invalid header value for '{}': {}", key, e))?;
        map.append(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: Option<String>, headers: Vec<(String, String)>) -> ReqwestClient {
        ReqwestClient::new(ClientOptions {
            base_url,
            headers,
            ..ClientOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_resolve_url() {
        let c = client(Some("http://api.local/v1/".to_string()), Vec::new());
        assert_eq!(c.resolve_url("/users"), "http://api.local/v1/users");
        assert_eq!(c.resolve_url("users"), "http://api.local/v1/users");
        assert_eq!(c.resolve_url("https://other/x"), "https://other/x");

        let plain = client(Some("  ".to_string()), Vec::new());
        assert_eq!(plain.resolve_url("/users"), "/users");
    }

    #[test]
    fn test_invalid_default_header() {
        let result = ReqwestClient::new(ClientOptions {
            headers: vec![("bad header".to_string(), "x".to_string())],
            ..ClientOptions::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_post_sends_json_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items"))
            .and(query_param("page", "2"))
            .and(header("content-type", "application/json"))
            .and(header("x-token", "request"))
            .and(body_json(json!({"name": "widget"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-id", "7")
                    .set_body_string(r#"{"id": 7}"#),
            )
            .mount(&server)
            .await;

        let c = client(
            Some(server.uri()),
            vec![("X-Token".to_string(), "default".to_string())],
        );
        let params = RequestParams {
            headers: vec![("X-Token".to_string(), "request".to_string())],
            query: vec![("page".to_string(), "2".to_string())],
        };

        let response = c
            .post("/items", Some(json!({"name": "widget"})), &params)
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.headers["x-id"], vec!["7".to_string()]);
        assert_eq!(response.body, br#"{"id": 7}"#.to_vec());
    }

    #[tokio::test]
    async fn test_method_send_dispatches_verb() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/items/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let c = client(None, Vec::new());
        let url = format!("{}/items/1", server.uri());
        let response = Method::Delete
            .send(&c, &url, None, &RequestParams::default())
            .await
            .unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let c = client(None, Vec::new());
        let err = c
            .get("http://127.0.0.1:1/unreachable", &RequestParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
