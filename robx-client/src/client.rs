//! Request dispatcher for the Roblox web API
//!
//! Every call runs the same path: bind the session to the calling context,
//! execute under the retry policy, then let the anti-forgery coordinator
//! inspect the result. The caller only ever sees a [`Response`] or the
//! propagated error once retries are exhausted.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, StatusCode};
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::request::{Request, RequestBuilder};
use crate::response::Response;
use crate::retry::RetryPolicy;
use crate::session::Session;

/// Name of the authentication cookie
const AUTH_COOKIE_NAME: &str = ".ROBLOSECURITY";

/// How many characters of the auth cookie feed the identity marker
const AUTH_MARKER_LEN: usize = 12;

/// HTTP dispatcher for the Roblox web API
///
/// Clones share the underlying session, so a clone handed to a background
/// task keeps the same cookies, headers and anti-forgery token as the
/// original.
#[derive(Debug, Clone)]
pub struct HttpClient {
    session: Arc<RwLock<Session>>,
    config: Arc<ClientConfig>,
    retry: RetryPolicy,
    /// Internally owned sessions are rebound on context change; supplied
    /// ones are left alone
    owned_session: bool,
}

impl HttpClient {
    /// Create a client with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with a custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let session = Session::new(&config)?;
        Ok(Self {
            retry: config.retry_policy(),
            session: Arc::new(RwLock::new(session)),
            config: Arc::new(config),
            owned_session: true,
        })
    }

    /// Use an externally supplied connection client
    ///
    /// The client is used as-is: it is never rebuilt on context change and
    /// cookie handling stays with it. [`set_auth_cookie`] still records the
    /// cache-identity marker.
    ///
    /// [`set_auth_cookie`]: HttpClient::set_auth_cookie
    pub fn with_client(client: reqwest::Client) -> Result<Self> {
        let config = ClientConfig::default();
        let session = Session::external(&config, client)?;
        Ok(Self {
            retry: config.retry_policy(),
            session: Arc::new(RwLock::new(session)),
            config: Arc::new(config),
            owned_session: false,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start building a request with an arbitrary method
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, method, url)
    }

    /// Start building a GET request
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::GET, url)
    }

    /// Start building a POST request
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::POST, url)
    }

    /// Start building a PUT request
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::PUT, url)
    }

    /// Start building a PATCH request
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::PATCH, url)
    }

    /// Start building a DELETE request
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::DELETE, url)
    }

    /// Authenticate with a `.ROBLOSECURITY` token, or clear it with `None`
    ///
    /// Does not issue any request and will not fail on an invalid token;
    /// that surfaces on first use.
    pub fn set_auth_cookie(&self, token: Option<&str>) -> Result<()> {
        let domain = &self.config.cookie_domain;
        let url: url::Url = format!("https://www.{domain}/").parse()?;
        let mut session = self.session.write();
        match token {
            Some(token) => {
                session.jar.add_cookie_str(
                    &format!("{AUTH_COOKIE_NAME}={token}; Domain=.{domain}; Path=/"),
                    &url,
                );
                session.auth_marker = auth_marker_of(token);
            }
            None => {
                session.jar.add_cookie_str(
                    &format!("{AUTH_COOKIE_NAME}=; Domain=.{domain}; Path=/; Max-Age=0"),
                    &url,
                );
                session.auth_marker = String::new();
            }
        }
        Ok(())
    }

    /// Identity marker mixed into cache fingerprints: the last characters
    /// of the auth cookie, empty when unauthenticated
    pub fn auth_marker(&self) -> String {
        self.session.read().auth_marker.clone()
    }

    /// Execute a request through the full dispatcher path and drain the
    /// body into an owned snapshot
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let wire = self.dispatch(request).await?;
        let response = Response::from_reqwest(wire).await?;
        self.coordinate_csrf(request, response).await
    }

    /// Execute a request and hand back the raw wire response with the body
    /// undrained
    ///
    /// Shares the bind/retry/anti-forgery path with [`execute`]; streaming
    /// responses bypass caching entirely.
    ///
    /// [`execute`]: HttpClient::execute
    pub async fn execute_streaming(&self, request: &Request) -> Result<reqwest::Response> {
        let response = self.dispatch(request).await?;
        if request.is_mutating() {
            let token = response
                .headers()
                .get(self.config.csrf_token_header.as_str())
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            if let Some(token) = token {
                self.store_csrf_token(&token)?;
                if response.status() == StatusCode::FORBIDDEN {
                    debug!("anti-forgery token rejected, retrying once with refreshed token");
                    return self.dispatch(request).await;
                }
            }
        }
        Ok(response)
    }

    /// Anti-forgery coordination: harvest a rotated token and retry a
    /// rejected mutating request exactly once
    async fn coordinate_csrf(&self, request: &Request, response: Response) -> Result<Response> {
        if !request.is_mutating() {
            return Ok(response);
        }
        let token = response
            .header(&self.config.csrf_token_header)
            .map(str::to_owned);
        let Some(token) = token else {
            return Ok(response);
        };
        self.store_csrf_token(&token)?;
        if response.status() != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        // The result of the single retry is returned as-is, rejection
        // included.
        debug!("anti-forgery token rejected, retrying once with refreshed token");
        let wire = self.dispatch(request).await?;
        Response::from_reqwest(wire).await
    }

    /// Remember the rotating token on the session's default headers
    fn store_csrf_token(&self, token: &str) -> Result<()> {
        let name = HeaderName::try_from(self.config.csrf_token_header.as_str())
            .map_err(|_| Error::invalid_header(&self.config.csrf_token_header))?;
        let value = HeaderValue::from_str(token)
            .map_err(|_| Error::invalid_header(&self.config.csrf_token_header))?;
        trace!("storing rotated anti-forgery token");
        self.session.write().headers.insert(name, value);
        Ok(())
    }

    /// Make sure the session belongs to the calling context
    fn ensure_bound(&self) -> Result<()> {
        if !self.owned_session {
            return Ok(());
        }
        if self.session.read().needs_bind() {
            self.session.write().ensure_for_context(&self.config)?;
        }
        Ok(())
    }

    /// Issue a request under the retry policy
    async fn dispatch(&self, request: &Request) -> Result<reqwest::Response> {
        self.ensure_bound()?;

        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                method = %request.method(),
                url = %request.url(),
                attempt,
                "dispatching request"
            );
            match self.send_once(request).await {
                Ok(response) => {
                    trace!(status = %response.status(), "response received");
                    return Ok(response);
                }
                Err(error) => match RetryPolicy::classify(&error) {
                    Some(kind) if attempt < max_attempts => {
                        let backoff = self.retry.backoff(kind, attempt);
                        warn!(
                            %error,
                            attempt,
                            ?backoff,
                            "transient transport failure, will retry"
                        );
                        sleep(backoff).await;
                    }
                    _ => return Err(Error::Http(error)),
                },
            }
        }
    }

    /// Build and send the wire request once
    async fn send_once(
        &self,
        request: &Request,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let (client, headers) = {
            let session = self.session.read();
            (session.client.clone(), session.headers.clone())
        };

        let mut builder = client
            .request(request.method().clone(), request.url())
            .headers(headers)
            .headers(request.headers.clone());

        let pairs = query_pairs(request.query());
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        if let Some(body) = request.json_body() {
            builder = builder.json(body);
        }

        builder.send().await
    }
}

/// Flatten query parameters to wire pairs: arrays repeat the key, null
/// values are dropped
fn query_pairs(query: &[(String, Value)]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(query.len());
    for (key, value) in query {
        push_query_pairs(&mut pairs, key, value);
    }
    pairs
}

fn push_query_pairs(pairs: &mut Vec<(String, String)>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                push_query_pairs(pairs, key, item);
            }
        }
        Value::String(s) => pairs.push((key.to_string(), s.clone())),
        other => pairs.push((key.to_string(), other.to_string())),
    }
}

/// Last characters of the auth cookie, used to separate cache identity
/// between signed-in users
fn auth_marker_of(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let start = chars.len().saturating_sub(AUTH_MARKER_LEN);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_marker_takes_cookie_suffix() {
        assert_eq!(auth_marker_of("ABCDEFGHIJKLMNOP"), "EFGHIJKLMNOP");
        assert_eq!(auth_marker_of("short"), "short");
        assert_eq!(auth_marker_of(""), "");
    }

    #[test]
    fn test_query_pairs_flattening() {
        let query = vec![
            ("name".to_string(), Value::from("builderman")),
            ("limit".to_string(), Value::from(25)),
            ("archived".to_string(), Value::from(false)),
            ("skip".to_string(), Value::Null),
            (
                "ids".to_string(),
                Value::from(vec![Value::from(1), Value::from(2)]),
            ),
        ];
        let pairs = query_pairs(&query);
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "builderman".to_string()),
                ("limit".to_string(), "25".to_string()),
                ("archived".to_string(), "false".to_string()),
                ("ids".to_string(), "1".to_string()),
                ("ids".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_builder_produces_descriptor() {
        let client = HttpClient::new().unwrap();
        let request = client
            .post("https://users.roblox.com/v1/usernames/users")
            .query("b", 2)
            .query("a", 1)
            .json(&serde_json::json!({"usernames": ["builderman"]}))
            .header("x-extra", "1")
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url(), "https://users.roblox.com/v1/usernames/users");
        assert_eq!(request.query().len(), 2);
        assert!(request.json_body().is_some());
        assert_eq!(request.headers.get("x-extra").unwrap(), "1");
    }

    #[test]
    fn test_set_auth_cookie_updates_marker() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.auth_marker(), "");

        client
            .set_auth_cookie(Some("WARNING:-DO-NOT-SHARE-THIS-TOKEN"))
            .unwrap();
        assert_eq!(client.auth_marker(), "E-THIS-TOKEN");

        client.set_auth_cookie(None).unwrap();
        assert_eq!(client.auth_marker(), "");
    }
}
