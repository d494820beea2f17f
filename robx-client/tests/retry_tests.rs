//! Retry policy integration tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use robx_client::{ClientConfig, Error, HttpClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry_config() -> ClientConfig {
    ClientConfig::new()
        .with_connect_backoff(Duration::from_millis(10))
        .with_race_backoff(Duration::from_millis(5))
}

#[tokio::test]
async fn test_connect_failure_propagates_after_retries() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::with_config(fast_retry_config()).unwrap();

    let started = std::time::Instant::now();
    let result = client.get(format!("http://{addr}/v1/y")).send().await;
    let elapsed = started.elapsed();

    match result {
        Err(Error::Http(error)) => assert!(error.is_connect()),
        other => panic!("expected a connect error, got {other:?}"),
    }
    // Two linear backoffs were slept through: 10ms + 20ms
    assert!(elapsed >= Duration::from_millis(30));
}

#[tokio::test]
async fn test_transport_failure_triggers_exactly_three_attempts() {
    // A server that accepts and immediately closes every connection: each
    // attempt fails mid-message and each attempt opens a fresh connection.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    drop(socket);
                }
                Err(_) => break,
            }
        }
    });

    let client = HttpClient::with_config(fast_retry_config()).unwrap();
    let result = client.get(format!("http://{addr}/v1/y")).send().await;

    assert!(matches!(result, Err(Error::Http(_))));
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_server_errors_are_returned_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let response = client
        .get(format!("{}/v1/broken", server.uri()))
        .send()
        .await
        .unwrap();

    // Server errors are a response, not a transport failure
    assert_eq!(response.status_code(), 500);
}
