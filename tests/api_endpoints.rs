//! Integration tests for the stub backend's REST endpoints
//!
//! These tests verify that every endpoint answers with the expected envelope
//! after accounts are created and funds move.

use axum_test::TestServer;
use cosmos_demo::api::{build_router, StubNode};
use cosmos_demo::config::ServerConfig;
use serde_json::{json, Value};
use std::sync::Arc;

fn server() -> (TestServer, Arc<StubNode>) {
    let node = StubNode::new_shared(&ServerConfig::default());
    let app = build_router(node.clone());
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, node)
}

#[tokio::test]
async fn test_wallet_endpoints() {
    let (server, node) = server();

    // Test /health
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "ok");

    // Test /create_account
    let response = server
        .post("/create_account")
        .json(&json!({"name": "alice"}))
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["account_name"], "alice");
    let alice = json["address"].as_str().unwrap().to_string();
    assert!(alice.starts_with("cosmos1"));

    // Test /account_balance
    let response = server
        .get(&format!("/account_balance?address={}", alice))
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["address"], alice.as_str());
    assert_eq!(json["balance"]["balances"][0]["denom"], "stake");
    assert_eq!(json["balance"]["balances"][0]["amount"], "1000");
    assert_eq!(json["balance"]["pagination"]["total"], "1");

    // Test /transfer
    let response = server
        .post("/transfer")
        .json(&json!({"from": "alice", "to": "cosmos1bob", "amount": "300", "denom": "stake"}))
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    let hash = json["tx_hash"].as_str().unwrap().to_string();
    assert_eq!(hash.len(), 64);

    // Test /query_tx
    let response = server.get(&format!("/query_tx?hash={}", hash)).await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["tx_hash"], hash.as_str());
    assert_eq!(json["tx_data"]["code"], 0);
    assert_eq!(json["tx_data"]["to"], "cosmos1bob");

    // Test /node_status
    let response = server.get("/node_status").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"]["node_info"]["network"], "demochain");
    assert_eq!(json["status"]["sync_info"]["latest_block_height"], "2");
    assert_eq!(json["status"]["sync_info"]["catching_up"], false);

    let (served, failed) = node.request_counts();
    assert_eq!(served, 6);
    assert_eq!(failed, 0);
}

#[tokio::test]
async fn test_rejections_use_the_envelope() {
    let (server, _node) = server();
    server
        .post("/create_account")
        .json(&json!({"name": "alice"}))
        .await;

    // Duplicate account
    let response = server
        .post("/create_account")
        .json(&json!({"name": "alice"}))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "key alice already exists");

    // Insufficient funds
    let response = server
        .post("/transfer")
        .json(&json!({"from": "alice", "to": "cosmos1bob", "amount": "5000", "denom": "stake"}))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["error"], "insufficient funds: 1000stake < 5000stake");

    // Unknown sender
    let response = server
        .post("/transfer")
        .json(&json!({"from": "carol", "to": "cosmos1bob", "amount": "1", "denom": "stake"}))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 404);

    // Unknown transaction
    let response = server
        .get("/query_tx?hash=ABCDEF")
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 404);
    let json: Value = response.json();
    assert_eq!(json["success"], false);

    // Missing query parameter
    let response = server.get("/account_balance").expect_failure().await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("address"));
}

#[tokio::test]
async fn test_malformed_body_is_rejected_with_envelope() {
    let (server, _node) = server();
    let response = server
        .post("/transfer")
        .json(&json!({"from": "alice"}))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_unknown_address_has_no_balances() {
    let (server, _node) = server();
    let response = server.get("/account_balance?address=cosmos1nobody").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["balance"]["balances"], json!([]));
}
