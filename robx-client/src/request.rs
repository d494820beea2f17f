//! Request descriptors and the builder surface

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::response::Response;

/// An immutable description of a single HTTP request
///
/// Everything that identifies the call lives here; the caching layer
/// derives its fingerprint from this descriptor and nothing else.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) query: Vec<(String, Value)>,
    pub(crate) json: Option<Value>,
    pub(crate) headers: HeaderMap,
}

impl Request {
    /// Create a request with no query parameters or body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            json: None,
            headers: HeaderMap::new(),
        }
    }

    /// Request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters in insertion order
    pub fn query(&self) -> &[(String, Value)] {
        &self.query
    }

    /// JSON body, if any
    pub fn json_body(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Whether the verb mutates upstream state and must carry the
    /// anti-forgery token
    pub(crate) fn is_mutating(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }
}

/// Borrowing builder returned by the verb methods on [`HttpClient`]
///
/// Header and body conversion failures are deferred until [`send`] so the
/// builder chain stays infallible.
///
/// [`send`]: RequestBuilder::send
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    request: Request,
    error: Option<Error>,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(client: &'a HttpClient, method: Method, url: impl Into<String>) -> Self {
        Self {
            client,
            request: Request::new(method, url),
            error: None,
        }
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.request.json = Some(value),
            Err(error) => self.error = Some(error.into()),
        }
        self
    }

    /// Set a request-scoped header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.request.headers.insert(name, value);
            }
            _ => self.error = Some(Error::invalid_header(name)),
        }
        self
    }

    /// Consume the builder and return the immutable descriptor
    pub fn build(self) -> Result<Request> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.request),
        }
    }

    /// Execute the request through the full dispatcher path
    pub async fn send(self) -> Result<Response> {
        let client = self.client;
        let request = self.build()?;
        client.execute(&request).await
    }

    /// Execute the request and hand back the raw wire response with the
    /// body undrained; streaming responses are never cached
    pub async fn send_streaming(self) -> Result<reqwest::Response> {
        let client = self.client;
        let request = self.build()?;
        client.execute_streaming(&request).await
    }
}
