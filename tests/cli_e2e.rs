//! End-to-end CLI tests for the lbxd binary.

use assert_cmd::Command;
use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn lbxd() -> Command {
    let mut cmd = Command::cargo_bin("lbxd").unwrap();
    // Keep the developer's environment out of the run
    cmd.env_remove("LBXD_KEY")
        .env_remove("LBXD_SECRET")
        .env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    lbxd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Letterboxd"))
        .stdout(predicate::str::contains("fetch"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    lbxd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lbxd"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    lbxd()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_encode_member_id() {
    lbxd()
        .args(["encode", "12345", "--member"])
        .assert()
        .success()
        .stdout("w7f\n");
}

#[test]
fn test_binary_encode_film_id() {
    lbxd()
        .args(["encode", "6"])
        .assert()
        .success()
        .stdout("Y\n");
}

#[test]
fn test_binary_encode_negative_fails() {
    lbxd()
        .args(["encode", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn test_binary_decode_round_trips_encode_output() {
    lbxd()
        .args(["decode", "w7f", "--with-kind"])
        .assert()
        .success()
        .stdout("12345\tsecondary\n");
}

#[test]
fn test_binary_decode_reports_unknown_tag_digit() {
    lbxd()
        .args(["decode", "3", "--with-kind"])
        .assert()
        .success()
        .stdout("0\tunknown\n");
}

#[test]
fn test_binary_decode_without_kind_prints_internal_id() {
    lbxd()
        .args(["decode", "Y"])
        .assert()
        .success()
        .stdout("6\n");
}

#[test]
fn test_binary_decode_rejects_invalid_character() {
    lbxd()
        .args(["decode", "ab-c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid character"));
}

#[test]
fn test_binary_watchlist_without_credentials_fails() {
    lbxd()
        .current_dir(std::env::temp_dir())
        .args(["watchlist", "1Ap5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LBXD_KEY"));
}

#[test]
fn test_binary_fetch_rejects_zero_progress_interval() {
    lbxd()
        .args(["fetch", "film/2bbs", "--progress-interval", "0"])
        .assert()
        .failure();
}

#[test]
fn test_binary_fetch_with_empty_stdin_exits_cleanly() {
    lbxd()
        .arg("fetch")
        .write_stdin("")
        .assert()
        .success()
        .stdout("");
}

#[tokio::test]
async fn test_binary_fetch_reports_unresolved_targets_on_stderr() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v0/film/2bbs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "2bbs"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/film/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/film/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let api_base = format!("{}/api/v0", server.uri());
    // The mock server needs the runtime while the binary runs
    let output = tokio::task::spawn_blocking(move || {
        lbxd()
            .current_dir(std::env::temp_dir())
            .env("LBXD_KEY", "test-key")
            .env("LBXD_SECRET", "test-secret")
            .env("LBXD_API_BASE", api_base)
            .args(["fetch", "film/2bbs", "film/gone", "film/down", "--max-retries", "0"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    output
        .assert()
        .success()
        .stdout("{\"id\":\"2bbs\"}\n")
        .stderr(predicate::str::contains("not-found\tfilm/gone"))
        .stderr(predicate::str::contains("failed\tfilm/down\t1\t"));
}
