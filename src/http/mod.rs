//! HTTP transport
//!
//! The runner only talks to the [`HttpClient`] trait, one call per verb.
//! [`ReqwestClient`] is the implementation the binary uses.

mod client;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::common::{Error, Result};

pub use client::{ClientOptions, ReqwestClient};

/// Per-request headers and query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    /// Ordered; repeated names are sent as repeated headers
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

/// A completed response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// All values of each header, keyed by lowercase name
    pub headers: HashMap<String, Vec<String>>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, params: &RequestParams) -> Result<HttpResponse>;

    async fn post(
        &self,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse>;

    async fn put(
        &self,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse>;

    async fn delete(&self, url: &str, params: &RequestParams) -> Result<HttpResponse>;

    async fn patch(
        &self,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse>;

    async fn head(&self, url: &str, params: &RequestParams) -> Result<HttpResponse>;

    async fn options(&self, url: &str, params: &RequestParams) -> Result<HttpResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Methods that carry a request body
    pub fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    /// Issue the request through the matching client call.
    /// `body` is ignored for methods without one.
    pub async fn send(
        self,
        client: &dyn HttpClient,
        url: &str,
        body: Option<Value>,
        params: &RequestParams,
    ) -> Result<HttpResponse> {
        match self {
            Method::Get => client.get(url, params).await,
            Method::Post => client.post(url, body, params).await,
            Method::Put => client.put(url, body, params).await,
            Method::Delete => client.delete(url, params).await,
            Method::Patch => client.patch(url, body, params).await,
            Method::Head => client.head(url, params).await,
            Method::Options => client.options(url, params).await,
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        };
        f.write_str(label)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Patch".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!(" OPTIONS ".parse::<Method>().unwrap(), Method::Options);
    }

    #[test]
    fn test_unsupported_method() {
        let err = "TRACE".parse::<Method>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod(ref m) if m == "TRACE"));
        assert_eq!(err.to_string(), "Unsupported HTTP method: TRACE");
    }

    #[test]
    fn test_has_body() {
        assert!(Method::Post.has_body());
        assert!(Method::Put.has_body());
        assert!(Method::Patch.has_body());
        assert!(!Method::Get.has_body());
        assert!(!Method::Delete.has_body());
    }
}
