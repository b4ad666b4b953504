#![deny(clippy::all)]

use std::sync::Arc;

use httpmock::MockServer;
use serde_json::json;
use spendwise::Client;
use spendwise::cache::CacheConfig;
use spendwise::config::{ApiSettings, BudgetsCommand, ExpensesCommand};
use spendwise::infra::storage::{MemoryStorage, StoredCredentials};
use tempfile::TempDir;
use url::Url;

use crate::error::CliError;
use crate::handlers::{budgets, expenses};

fn client(server: &MockServer) -> Client {
    let base = Url::parse(&server.url("/api/")).expect("base url");
    let storage = Arc::new(MemoryStorage::with_credentials(StoredCredentials {
        access_token: Some("access-1".into()),
        refresh_token: Some("refresh-1".into()),
    }));
    let client = Client::from_parts(&ApiSettings::new(base), CacheConfig::default(), storage)
        .expect("client");
    client.session().restore();
    client
}

#[test]
fn write_output_creates_file() -> Result<(), CliError> {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("export.csv");
    crate::io::write_output(Some(&path), b"title,amount\n")?;
    assert_eq!(
        std::fs::read_to_string(&path).expect("read"),
        "title,amount\n"
    );
    Ok(())
}

#[test]
fn session_expired_requires_login() {
    let err = CliError::from(spendwise::pipeline::ApiError::SessionExpired);
    assert!(err.requires_login());
    let err = CliError::from(spendwise::pipeline::ApiError::NotFound);
    assert!(!err.requires_login());
}

#[tokio::test]
async fn expenses_list_sends_page_offsets_with_bearer() -> Result<(), CliError> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/expenses/")
                .header("authorization", "Bearer access-1")
                .query_param("offset", "20")
                .query_param("limit", "20")
                .query_param("category", "food");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "count": 21, "results": [] }));
        })
        .await;

    let client = client(&server);
    let cmd = ExpensesCommand::List {
        page: 2,
        from_date: None,
        to_date: None,
        category: Some("food".into()),
        min_amount: None,
        max_amount: None,
    };
    expenses::handle(&client, cmd).await?;

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn expenses_export_writes_csv_to_file() -> Result<(), CliError> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("GET").path("/api/expenses/export/");
            then.status(200)
                .header("content-type", "text/csv")
                .body("title,amount\nCoffee,3.50\n");
        })
        .await;

    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("expenses.csv");
    let client = client(&server);
    expenses::handle(
        &client,
        ExpensesCommand::Export {
            output: Some(path.clone()),
        },
    )
    .await?;

    mock.assert_async().await;
    assert_eq!(
        std::fs::read_to_string(&path).expect("read export"),
        "title,amount\nCoffee,3.50\n"
    );
    Ok(())
}

#[tokio::test]
async fn budgets_create_posts_body() -> Result<(), CliError> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("POST")
                .path("/api/budgets/")
                .json_body(json!({ "category": "food", "amount": "300.00" }));
            then.status(201)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": "6f1c2a9e-8d7b-4c3a-9e2f-1a2b3c4d5e6f",
                    "category": "food",
                    "amount": "300.00"
                }));
        })
        .await;

    let client = client(&server);
    budgets::handle(
        &client,
        BudgetsCommand::Create {
            category: "food".into(),
            amount: "300.00".into(),
        },
    )
    .await?;

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn validation_errors_surface_details() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("POST").path("/api/budgets/");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(json!({ "amount": ["A valid number is required."] }));
        })
        .await;

    let client = client(&server);
    let err = budgets::handle(
        &client,
        BudgetsCommand::Create {
            category: "food".into(),
            amount: "lots".into(),
        },
    )
    .await
    .expect_err("validation error");

    assert!(err.to_string().contains("A valid number is required."));
    assert!(!err.requires_login());
}
