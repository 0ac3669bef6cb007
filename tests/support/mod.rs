//! Shared helpers for integration tests: mock-backed clients and scripted responders.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lbxd::{ApiClient, ApiConfig};
use wiremock::{MockServer, Respond, ResponseTemplate};

pub const TEST_KEY: &str = "test-key";
pub const TEST_SECRET: &str = "test-secret";

/// API base path the mock server serves under.
pub const API_PREFIX: &str = "/api/v0";

/// Client whose API base and site base both point at `server`.
pub fn client_for(server: &MockServer) -> ApiClient {
    let config = ApiConfig::new(TEST_KEY, TEST_SECRET)
        .with_api_base(format!("{}{API_PREFIX}", server.uri()))
        .with_site_base(server.uri());
    ApiClient::new(config).expect("client should build")
}

/// Responder that fails the first `fail_count` requests with `fail_status`, then
/// returns 200 with `body`.
pub struct FlakyResponder {
    request_count: Arc<AtomicUsize>,
    fail_count: usize,
    fail_status: u16,
    body: serde_json::Value,
}

impl FlakyResponder {
    pub fn new(fail_count: usize, fail_status: u16, body: serde_json::Value) -> Self {
        Self {
            request_count: Arc::new(AtomicUsize::new(0)),
            fail_count,
            fail_status,
            body,
        }
    }

    /// Handle for reading how many requests were served.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.request_count)
    }
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.request_count.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_count {
            ResponseTemplate::new(self.fail_status).set_body_string("unavailable")
        } else {
            ResponseTemplate::new(200).set_body_json(self.body.clone())
        }
    }
}
