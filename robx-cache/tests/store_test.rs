//! Integration tests for the response store

use std::time::Duration;

use pretty_assertions::assert_eq;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use robx_cache::{Fingerprint, ResponseCache, RetentionPolicy};
use robx_client::Response;
use tempfile::TempDir;

fn fingerprint(url: &str) -> Fingerprint {
    Fingerprint::compute(&Method::GET, url, &[], None, "")
}

fn response(body: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    Response::from_parts(StatusCode::OK, headers, body.as_bytes().to_vec())
}

#[tokio::test]
async fn test_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = ResponseCache::new(dir.path());
    let key = fingerprint("https://example.com/v1/x");
    let original = response(r#"{"data":[1,2,3]}"#);

    cache.put(&key, &original).await;
    let restored = cache.get(&key).await.unwrap();

    assert_eq!(restored.status_code(), original.status_code());
    assert_eq!(restored.content(), original.content());
    assert_eq!(restored.header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_missing_entry_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = ResponseCache::new(dir.path());

    assert!(cache.get(&fingerprint("https://example.com/v1/gone")).await.is_none());
}

#[tokio::test]
async fn test_error_bodies_are_never_written() {
    let dir = TempDir::new().unwrap();
    let cache = ResponseCache::new(dir.path());
    let key = fingerprint("https://example.com/v1/x");

    cache
        .put(&key, &response(r#"{"errors":[{"code":1}]}"#))
        .await;

    assert!(cache.get(&key).await.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_fresh_write_replaces_entry() {
    let dir = TempDir::new().unwrap();
    let cache = ResponseCache::new(dir.path());
    let key = fingerprint("https://example.com/v1/x");

    cache.put(&key, &response(r#"{"rev":1}"#)).await;
    cache.put(&key, &response(r#"{"rev":2}"#)).await;

    let restored = cache.get(&key).await.unwrap();
    assert_eq!(restored.content(), br#"{"rev":2}"#);
}

#[tokio::test]
async fn test_corrupt_entry_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = ResponseCache::new(dir.path());
    let key = fingerprint("https://example.com/v1/x");

    std::fs::write(dir.path().join(key.file_name()), b"not a snapshot").unwrap();

    assert!(cache.get(&key).await.is_none());
}

#[tokio::test]
async fn test_no_temporary_files_survive_a_write() {
    let dir = TempDir::new().unwrap();
    let cache = ResponseCache::new(dir.path());
    let key = fingerprint("https://example.com/v1/x");

    cache.put(&key, &response(r#"{"ok":true}"#)).await;

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".cache"));
}

#[tokio::test]
async fn test_retention_cutoff_turns_old_entries_into_misses() {
    let dir = TempDir::new().unwrap();
    let key = fingerprint("https://example.com/v1/x");

    ResponseCache::new(dir.path())
        .put(&key, &response(r#"{"ok":true}"#))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let strict = ResponseCache::new(dir.path())
        .with_retention(RetentionPolicy::MaxAge(Duration::from_millis(10)));
    assert!(strict.get(&key).await.is_none());

    let lenient = ResponseCache::new(dir.path())
        .with_retention(RetentionPolicy::MaxAge(Duration::from_secs(3600)));
    assert!(lenient.get(&key).await.is_some());

    // The default policy never expires anything
    let permanent = ResponseCache::new(dir.path());
    assert!(permanent.get(&key).await.is_some());
}
