//! Request fingerprinting for cache identity
//!
//! Two logically identical requests must map to the same fingerprint no
//! matter how their parameters are ordered, and two signed-in identities
//! must never share one.

use reqwest::Method;
use serde_json::Value;
use sha2::{Digest, Sha256};
use url::Url;

/// Query key that correlates a request to a session; it must never
/// participate in cache identity
const SESSION_CORRELATION_KEY: &str = "sessionId";

/// Stable digest identifying a logical request together with the acting
/// identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a request for the given identity marker
    pub fn compute(
        method: &Method,
        url: &str,
        query: &[(String, Value)],
        json: Option<&Value>,
        auth_marker: &str,
    ) -> Self {
        let mut query_terms: Vec<String> = query
            .iter()
            .filter(|(key, _)| key != SESSION_CORRELATION_KEY)
            .map(|(key, value)| format!("{key}={}", normalize_value(value)))
            .collect();
        query_terms.sort();

        let parts = [
            method.as_str().to_ascii_lowercase(),
            normalize_url(url),
            query_terms.join("&"),
            json.map_or_else(|| "null".to_string(), normalize_value),
            auth_marker.to_string(),
        ];

        let mut hasher = Sha256::new();
        hasher.update(parts.join("|").as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe cache file name
    ///
    /// A secondary hash of the fingerprint keeps names short; the digest
    /// itself stays the logical key.
    pub fn file_name(&self) -> String {
        format!("{:x}.cache", md5::compute(self.0.as_bytes()))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Re-encode a URL with its query pairs sorted by key so that parameter
/// order in the query string never matters
fn normalize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if pairs.is_empty() {
        return parsed.to_string();
    }
    pairs.sort();
    {
        let mut serializer = parsed.query_pairs_mut();
        serializer.clear();
        serializer.extend_pairs(pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())));
    }
    parsed.to_string()
}

/// Canonical string rendering of a parameter value
///
/// Mappings flatten to sorted pairs (minus the session-correlation key),
/// sequences sort element-wise, comma-joined strings are treated as sets,
/// booleans and null take fixed lower-case forms.
fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => {
            if text.contains(',') {
                let mut items: Vec<&str> = text.split(',').map(str::trim).collect();
                items.sort_unstable();
                format!("[{}]", items.join(","))
            } else {
                text.trim().to_string()
            }
        }
        Value::Array(items) => {
            let mut normalized: Vec<String> = items.iter().map(normalize_value).collect();
            normalized.sort();
            format!("[{}]", normalized.join(","))
        }
        Value::Object(map) => {
            let mut pairs: Vec<String> = map
                .iter()
                .filter(|(key, _)| key.as_str() != SESSION_CORRELATION_KEY)
                .map(|(key, value)| format!("{key}:{}", normalize_value(value)))
                .collect();
            pairs.sort();
            format!("{{{}}}", pairs.join(","))
        }
    }
}
