//! Disk-backed response caching for the Roblox web API client
//!
//! This crate layers an opportunistic, permanent cache over
//! [`robx_client::HttpClient`]:
//! - Stable request fingerprints that ignore parameter ordering and never
//!   collide across signed-in identities
//! - A one-file-per-fingerprint store with atomic whole-file replacement
//! - A cached client wrapper whose `cache_get`/`cache_post` serve stale
//!   entries instantly and refresh them in the background

use std::path::{Path, PathBuf};

pub mod cached_client;
pub mod error;
pub mod fingerprint;
pub mod store;

pub use cached_client::{CachedHttpClient, CachedRequestBuilder};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use store::{ResponseCache, RetentionPolicy};

/// Get the base robx cache directory
///
/// Returns a path like:
/// - Linux: `~/.cache/robx`
/// - macOS: `~/Library/Caches/robx`
/// - Windows: `C:\Users\{user}\AppData\Local\robx\cache`
pub fn get_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .ok_or(Error::CacheDirectoryNotFound)
        .map(|dir| dir.join("robx"))
}

/// Ensure a directory exists, creating it if necessary
pub(crate) async fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if tokio::fs::metadata(path).await.is_err() {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}
