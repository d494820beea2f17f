//! Owned response snapshots

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::Result;

/// A fully drained HTTP response
///
/// The dispatcher returns these instead of [`reqwest::Response`] so that
/// responses can be cloned, inspected repeatedly, and round-tripped through
/// the disk cache. Header lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Assemble a response from parts (the disk cache uses this when
    /// rehydrating a stored snapshot)
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Drain a wire response into an owned snapshot
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Numeric status code
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// All response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Look up a single header value; lookup is case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as text, lossy on invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Raw body bytes
    pub fn content(&self) -> &[u8] {
        &self.body
    }

    /// Raw body as [`Bytes`]
    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Whether the body is a structured upstream error (`{"errors": [...]}`)
    ///
    /// Such responses are returned to callers unchanged but must never be
    /// written to the disk cache.
    pub fn is_api_error(&self) -> bool {
        match serde_json::from_slice::<serde_json::Value>(&self.body) {
            Ok(serde_json::Value::Object(map)) => {
                matches!(map.get("errors"), Some(serde_json::Value::Array(_)))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn response_with_body(body: &str) -> Response {
        Response::from_parts(
            StatusCode::OK,
            HeaderMap::new(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-CSRF-Token", HeaderValue::from_static("token"));
        let response = Response::from_parts(StatusCode::OK, headers, Vec::new());

        assert_eq!(response.header("x-csrf-token"), Some("token"));
        assert_eq!(response.header("X-CSRF-TOKEN"), Some("token"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_json_accessor() {
        let response = response_with_body(r#"{"name":"builderman","id":156}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["name"], "builderman");
        assert_eq!(value["id"], 156);
    }

    #[test]
    fn test_json_parse_failure() {
        let response = response_with_body("not json");
        let result: Result<serde_json::Value> = response.json();
        assert!(matches!(result, Err(crate::Error::Json(_))));
    }

    #[test]
    fn test_text_and_content() {
        let response = response_with_body("hello");
        assert_eq!(response.text(), "hello");
        assert_eq!(response.content(), b"hello");
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_api_error_detection() {
        assert!(response_with_body(r#"{"errors":[{"code":1}]}"#).is_api_error());
        assert!(response_with_body(r#"{"errors":[]}"#).is_api_error());
        assert!(!response_with_body(r#"{"errors":"nope"}"#).is_api_error());
        assert!(!response_with_body(r#"{"data":[]}"#).is_api_error());
        assert!(!response_with_body("[1,2,3]").is_api_error());
        assert!(!response_with_body("not json").is_api_error());
    }
}
