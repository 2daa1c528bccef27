mod common;

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::test_service;
use http_body_util::BodyExt;
use khata::api::{AppState, build_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_app() -> Result<(Router, TempDir)> {
    let (service, temp) = test_service().await?;
    Ok((build_router(AppState::new(service)), temp))
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn entry_body(party_type: &str, party_id: &str, credit: Value, debit: Value) -> Value {
    json!({
        "partyType": party_type,
        "partyId": party_id,
        "partyName": "Acme Traders",
        "type": "Purchase",
        "referenceNo": "PUR0001",
        "credit": credit,
        "debit": debit,
    })
}

#[tokio::test]
async fn test_create_entry_returns_created() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = send(
        &app,
        post_json("/api/ledger", entry_body("supplier", "S-1", json!(100), json!(0))),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Entry added");
    assert_eq!(body["entry"]["partyId"], "S-1");
    assert_eq!(body["entry"]["type"], "Purchase");
    assert_eq!(body["entry"]["balance"], 100.0);

    let (_, body) = send(
        &app,
        post_json("/api/ledger", entry_body("supplier", "S-1", json!("0"), json!("30.50"))),
    )
    .await?;
    assert_eq!(body["entry"]["balance"], 69.5);

    Ok(())
}

#[tokio::test]
async fn test_create_entry_reports_missing_fields() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = send(
        &app,
        post_json(
            "/api/ledger",
            json!({ "partyType": "customer", "partyName": "Beta", "debit": 10 }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Missing required fields: partyId, type, referenceNo"
    );

    let (_, ledger) = send(&app, get("/api/ledger/customer")).await?;
    assert_eq!(ledger["totalCount"], 0);

    Ok(())
}

#[tokio::test]
async fn test_create_entry_rejects_bad_values() -> Result<()> {
    let (app, _temp) = test_app().await?;

    for body in [
        entry_body("vendor", "S-1", json!(1), json!(0)),
        entry_body("supplier", "S-1", json!("ten"), json!(0)),
        entry_body("supplier", "S-1", json!(-5), json!(0)),
    ] {
        let (status, body) = send(&app, post_json("/api/ledger", body)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    Ok(())
}

#[tokio::test]
async fn test_create_entry_accepts_numeric_identifiers() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = send(
        &app,
        post_json(
            "/api/ledger",
            json!({
                "partyType": "customer",
                "partyId": 42,
                "partyName": "Walk-in",
                "mobileNumber": 9876543210u64,
                "type": "Sale",
                "referenceNo": 1001,
                "debit": 5,
                "date": "2024-03-15T10:30",
            }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["entry"]["partyId"], "42");
    assert_eq!(body["entry"]["mobileNumber"], "9876543210");
    assert_eq!(body["entry"]["referenceNo"], "1001");
    assert_eq!(body["entry"]["date"], "2024-03-15T10:30:00Z");

    let (_, balance) = send(&app, get("/api/ledger/customer/42/balance")).await?;
    assert_eq!(balance["balance"], -5.0);

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_a_bad_request() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let wrong_type = post_json(
        "/api/ledger",
        json!({ "partyType": "supplier", "partyName": { "first": "Acme" } }),
    );
    let broken_json = Request::builder()
        .method("POST")
        .uri("/api/ledger")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"partyType\": "))
        .unwrap();

    for request in [wrong_type, broken_json] {
        let (status, body) = send(&app, request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(
            body["message"]
                .as_str()
                .is_some_and(|m| m.starts_with("Invalid request body")),
            "{body}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_ledger_views_and_params() -> Result<()> {
    let (app, _temp) = test_app().await?;

    for (party_id, kind, debit) in [("C-1", "Sale", 50), ("C-2", "Sale", 20), ("C-1", "Receipt", 0)] {
        let mut body = entry_body("customer", party_id, json!(0), json!(debit));
        body["type"] = json!(kind);
        if kind == "Receipt" {
            body["credit"] = json!(50);
        }
        let (status, _) = send(&app, post_json("/api/ledger", body)).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/api/ledger/customer")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 1000);
    assert_eq!(body["totalDebit"], 70.0);
    assert_eq!(body["totalCredit"], 50.0);
    assert_eq!(body["customersWithBalance"], 1);
    assert!(body.get("netBalance").is_none());
    assert_eq!(body["ledger"].as_array().map(Vec::len), Some(3));

    let (_, filtered) = send(&app, get("/api/ledger/customer?filterType=Sale&limit=1&page=2")).await?;
    assert_eq!(filtered["totalCount"], 2);
    assert_eq!(filtered["ledger"].as_array().map(Vec::len), Some(1));

    let (_, aliased) = send(&app, get("/api/ledger/customer?type=Receipt")).await?;
    assert_eq!(aliased["totalCount"], 1);

    let (status, lenient) = send(&app, get("/api/ledger/customer?page=abc&limit=")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lenient["page"], 1);
    assert_eq!(lenient["limit"], 1000);

    let (_, supplier) = send(&app, get("/api/ledger/supplier")).await?;
    assert_eq!(supplier["totalCount"], 0);
    assert_eq!(supplier["netBalance"], 0.0);

    let (status, bad_date) = send(&app, get("/api/ledger/supplier?fromDate=yesterday")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_date["success"], false);

    Ok(())
}

#[tokio::test]
async fn test_party_balance_endpoint() -> Result<()> {
    let (app, _temp) = test_app().await?;

    send(
        &app,
        post_json("/api/ledger", entry_body("supplier", "S-9", json!(0), json!(12.25))),
    )
    .await?;

    let (status, body) = send(&app, get("/api/ledger/supplier/S-9/balance")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["partyType"], "supplier");
    assert_eq!(body["balance"], -12.25);

    let (_, unknown) = send(&app, get("/api/ledger/customer/S-9/balance")).await?;
    assert_eq!(unknown["balance"], 0.0);

    let (status, _) = send(&app, get("/api/ledger/vendor/S-9/balance")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_next_document_number_endpoint() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = send(&app, post_json("/api/documents/purchase/next-number", json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "purchase");
    assert_eq!(body["number"], "PUR0001");

    let (_, body) = send(&app, post_json("/api/documents/purchase/next-number", json!({}))).await?;
    assert_eq!(body["number"], "PUR0002");

    let (status, body) = send(&app, post_json("/api/documents/invoice/next-number", json!({}))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = send(&app, get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    Ok(())
}
