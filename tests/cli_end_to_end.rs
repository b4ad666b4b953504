#![deny(clippy::all)]

use std::path::Path;

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;

fn cli(server: &MockServer, credentials: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("spendwise-cli"));
    cmd.env_remove("SPENDWISE_CONFIG_FILE")
        .env_remove("SPENDWISE_PASSWORD")
        .arg("--api-url")
        .arg(server.url("/api/"))
        .arg("--credentials-file")
        .arg(credentials);
    cmd
}

fn identity() -> serde_json::Value {
    json!({
        "id": "42",
        "email": "ada@example.com",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "is_email_verified": true,
        "theme_preference": "light"
    })
}

#[test]
fn login_persists_session_for_next_invocation() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method("POST")
            .path("/api/auth/login/")
            .json_body(json!({ "email": "ada@example.com", "password": "hunter2" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "access": "access-1", "refresh": "refresh-1", "user": identity() }));
    });
    let list = server.mock(|when, then| {
        when.method("GET")
            .path("/api/expenses/")
            .header("authorization", "Bearer access-1")
            .query_param("offset", "0");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "count": 1,
                "results": [{
                    "id": "0b6d3f7e-2c1a-4e8b-9f5d-7a6c5b4e3d2f",
                    "title": "Coffee",
                    "amount": "3.50",
                    "currency": "USD",
                    "category": "food",
                    "expense_date": "2024-03-01"
                }]
            }));
    });

    let dir = TempDir::new().expect("tempdir");
    let credentials = dir.path().join("credentials.json");

    cli(&server, &credentials)
        .env("SPENDWISE_PASSWORD", "hunter2")
        .args(["auth", "login", "--email", "ada@example.com"])
        .assert()
        .success()
        .stdout(contains("\"email\": \"ada@example.com\""));
    login.assert();

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&credentials).expect("stored credentials"))
            .expect("json");
    assert_eq!(stored["access_token"], "access-1");
    assert_eq!(stored["refresh_token"], "refresh-1");

    cli(&server, &credentials)
        .args(["expenses", "list"])
        .assert()
        .success()
        .stdout(contains("\"title\": \"Coffee\""));
    list.assert();
}

#[test]
fn password_can_be_piped_on_stdin() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method("POST")
            .path("/api/auth/login/")
            .json_body(json!({ "email": "ada@example.com", "password": "from-stdin" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "access": "a", "refresh": "r", "user": identity() }));
    });

    let dir = TempDir::new().expect("tempdir");
    cli(&server, &dir.path().join("credentials.json"))
        .args(["auth", "login", "--email", "ada@example.com"])
        .write_stdin("from-stdin\n")
        .assert()
        .success();
    login.assert();
}

#[test]
fn expired_session_asks_to_log_in_again() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/budgets/");
        then.status(401)
            .json_body(json!({ "detail": "Given token not valid" }));
    });
    let refresh = server.mock(|when, then| {
        when.method("POST").path("/api/auth/token/refresh/");
        then.status(401)
            .json_body(json!({ "detail": "Token is blacklisted" }));
    });

    let dir = TempDir::new().expect("tempdir");
    let credentials = dir.path().join("credentials.json");
    std::fs::write(
        &credentials,
        r#"{"access_token":"old","refresh_token":"revoked"}"#,
    )
    .expect("seed credentials");

    cli(&server, &credentials)
        .args(["budgets", "list"])
        .assert()
        .failure()
        .stderr(contains("log in again"));
    refresh.assert();
    assert!(!credentials.exists());
}

#[test]
fn invalid_api_url_fails_fast() {
    let dir = TempDir::new().expect("tempdir");
    Command::new(assert_cmd::cargo::cargo_bin!("spendwise-cli"))
        .env_remove("SPENDWISE_CONFIG_FILE")
        .arg("--api-url")
        .arg("ftp://example.com/api/")
        .arg("--credentials-file")
        .arg(dir.path().join("credentials.json"))
        .args(["expenses", "list"])
        .assert()
        .code(2)
        .stderr(contains("api.base_url"));
}
