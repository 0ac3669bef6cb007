//! Integration tests for the signed API client against a mock server.

mod support;

use std::net::TcpListener;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use lbxd::{ApiClient, ApiConfig, ApiError, fetch_all};
use serde_json::json;
use sha2::Sha256;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{API_PREFIX, TEST_KEY, TEST_SECRET, client_for};

fn expected_signature(url: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
    mac.update(format!("GET\0{url}\0").as_bytes());
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[tokio::test]
async fn test_call_returns_parsed_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API_PREFIX}/film/2bbs")))
        .and(query_param("apikey", TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "2bbs", "name": "Stalker"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client.call("film/2bbs").await.unwrap();

    assert_eq!(body, json!({"id": "2bbs", "name": "Stalker"}));
}

#[tokio::test]
async fn test_call_signs_request_with_nonce_and_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API_PREFIX}/film/2bbs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.call("film/2bbs").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    // The server sees its own host name; the client signed against server.uri()
    let received = &requests[0].url;
    let url = format!(
        "{}{}?{}",
        server.uri(),
        received.path(),
        received.query().unwrap()
    );

    let params: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let names: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["apikey", "nonce", "timestamp", "signature"]);

    let nonce = &params[1].1;
    assert_eq!(nonce.len(), 36, "nonce should be a UUID: {nonce}");
    assert!(params[2].1.parse::<u64>().is_ok(), "timestamp should be unix seconds");

    let (unsigned, signature) = url.rsplit_once("&signature=").unwrap();
    assert_eq!(signature, expected_signature(unsigned));
}

#[tokio::test]
async fn test_call_nonce_differs_between_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.call("film/a").await.unwrap();
    client.call("film/a").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let nonces: Vec<String> = requests
        .iter()
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "nonce")
                .map(|(_, v)| v.into_owned())
                .unwrap()
        })
        .collect();
    assert_ne!(nonces[0], nonces[1]);
}

#[tokio::test]
async fn test_call_404_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.call("film/nope").await.unwrap_err();

    assert!(err.is_not_found(), "expected not found, got {err:?}");
    assert!(err.to_string().starts_with("404"));
    assert!(
        !err.to_string().contains(TEST_KEY),
        "error should not carry signed query params"
    );
}

#[tokio::test]
async fn test_call_server_error_maps_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.call("film/2bbs").await.unwrap_err();

    assert!(
        matches!(err, ApiError::HttpStatus { status: 503, .. }),
        "got {err:?}"
    );
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_call_non_json_body_maps_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.call("film/2bbs").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
}

/// Returns a base URL on a port nothing listens on.
fn closed_port_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn closed_port_client() -> ApiClient {
    let base = closed_port_base();
    let config = ApiConfig::new(TEST_KEY, TEST_SECRET)
        .with_api_base(format!("{base}{API_PREFIX}"))
        .with_site_base(base);
    ApiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_call_connection_refused_maps_to_network() {
    let client = closed_port_client();

    let err = client.call("film/2bbs").await.unwrap_err();
    assert!(
        matches!(err, ApiError::Network { .. } | ApiError::Timeout { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_transport_error_does_not_leak_signed_query() {
    let client = closed_port_client();

    let err = client.call("film/2bbs").await.unwrap_err();
    let mut messages = vec![err.to_string(), format!("{err:?}")];
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }

    for message in messages {
        for secret_part in ["apikey=", "signature=", "nonce=", TEST_SECRET] {
            assert!(
                !message.contains(secret_part),
                "{secret_part} leaked in: {message}"
            );
        }
    }
}

#[tokio::test]
async fn test_fetch_failure_message_does_not_leak_signed_query() {
    let client = Arc::new(closed_port_client());

    let report = fetch_all(client, ["film/2bbs"], 0, 1, 1).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    let last_error = &report.failed[0].last_error;
    assert!(last_error.contains("film/2bbs"), "got {last_error}");
    assert!(!last_error.contains("apikey="), "got {last_error}");
    assert!(!last_error.contains("signature="), "got {last_error}");
}
