//! One-file-per-fingerprint response store
//!
//! Caching is strictly best-effort: any serialization or filesystem
//! failure is a miss on the read path and a silent no-op on the write
//! path; a caller's request never fails because of the cache. Writes
//! replace the whole file through a temporary sibling so a concurrent
//! reader observes either the old or the new entry, never a partial one.
//! No locks are taken; the last writer wins.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use robx_client::Response;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;

/// How long entries keep being served from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Entries never expire; only a fresh successful response replaces one
    Permanent,
    /// Entries older than the cutoff are treated as misses
    MaxAge(Duration),
}

/// Serialized snapshot of a response
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Snapshot {
    fn from_response(response: &Response) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        Self {
            status: response.status_code(),
            headers,
            body: response.content().to_vec(),
        }
    }

    fn into_response(self) -> Result<Response> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|_| Error::corrupt_entry("invalid status code"))?;
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|_| Error::corrupt_entry("invalid header name"))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::corrupt_entry("invalid header value"))?;
            headers.append(name, value);
        }
        Ok(Response::from_parts(status, headers, self.body))
    }
}

/// Disk-backed response cache, one file per fingerprint
#[derive(Debug, Clone)]
pub struct ResponseCache {
    base_dir: PathBuf,
    retention: RetentionPolicy,
}

impl ResponseCache {
    /// Create a cache rooted at an explicit directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            retention: RetentionPolicy::Permanent,
        }
    }

    /// Create a cache in the platform temporary directory
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("robx_cache"))
    }

    /// Replace the retention policy (entries are permanent by default)
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Base directory of this cache
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.base_dir.join(fingerprint.file_name())
    }

    /// Look up an entry; any failure is a miss
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<Response> {
        match self.try_get(fingerprint).await {
            Ok(response) => response,
            Err(error) => {
                debug!(%error, fingerprint = fingerprint.as_str(), "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store an entry; failures and upstream error bodies are skipped
    pub async fn put(&self, fingerprint: &Fingerprint, response: &Response) {
        if response.is_api_error() {
            trace!(fingerprint = fingerprint.as_str(), "upstream error body, not caching");
            return;
        }
        if let Err(error) = self.try_put(fingerprint, response).await {
            debug!(%error, fingerprint = fingerprint.as_str(), "cache write failed, skipping");
        }
    }

    pub(crate) async fn try_get(&self, fingerprint: &Fingerprint) -> Result<Option<Response>> {
        let path = self.entry_path(fingerprint);
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            return Ok(None);
        };

        if let RetentionPolicy::MaxAge(max_age) = self.retention {
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| SystemTime::now().duration_since(modified).ok());
            match age {
                Some(age) if age <= max_age => {}
                _ => {
                    trace!(fingerprint = fingerprint.as_str(), "entry past retention cutoff");
                    return Ok(None);
                }
            }
        }

        let data = tokio::fs::read(&path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;
        Ok(Some(snapshot.into_response()?))
    }

    pub(crate) async fn try_put(&self, fingerprint: &Fingerprint, response: &Response) -> Result<()> {
        crate::ensure_dir(&self.base_dir).await?;

        let path = self.entry_path(fingerprint);
        let temp_path = path.with_extension("tmp");
        let data = serde_json::to_vec(&Snapshot::from_response(response))?;

        trace!(
            fingerprint = fingerprint.as_str(),
            bytes = data.len(),
            "writing cache entry"
        );

        // Write to a sibling and rename so readers never see a torn entry
        let write_result = async {
            tokio::fs::write(&temp_path, &data).await?;
            tokio::fs::rename(&temp_path, &path).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        if write_result.is_err() {
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        write_result?;

        Ok(())
    }
}
