//! Unit tests for the address validator
//!
//! These tests verify the fail-closed behavior: malformed addresses are
//! rejected without a network call, and the funding heuristic rejects
//! zero-balance addresses and treats any query failure as invalid.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use escrow_settler::evm_client::EvmClient;
use escrow_settler::validator::AddressValidator;

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{mount_balance, DUMMY_BUYER_ADDR};

fn build_validator(rpc_url: &str) -> AddressValidator {
    AddressValidator::new(Arc::new(EvmClient::new(rpc_url).unwrap()))
}

/// Test that a malformed address is rejected without touching the chain
/// Why: fail closed — junk input must not cost a network round trip
#[tokio::test]
async fn test_malformed_address_rejected_without_network_call() {
    let mock_server = MockServer::start().await;

    // Any JSON-RPC traffic at all would violate the fail-closed contract
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let validator = build_validator(&mock_server.uri());

    assert!(!validator.is_valid("").await);
    assert!(!validator.is_valid("0x1234").await);
    assert!(!validator.is_valid("not-an-address").await);
}

/// Test that a funded well-formed address is valid
#[tokio::test]
async fn test_funded_address_is_valid() {
    let mock_server = MockServer::start().await;
    mount_balance(&mock_server, DUMMY_BUYER_ADDR, 1_000_000).await;

    let validator = build_validator(&mock_server.uri());
    assert!(validator.is_valid(DUMMY_BUYER_ADDR).await);
}

/// Test that a zero-balance address is treated as invalid
/// Why: the positive-balance check is the funding sanity heuristic
#[tokio::test]
async fn test_zero_balance_address_is_invalid() {
    let mock_server = MockServer::start().await;
    mount_balance(&mock_server, DUMMY_BUYER_ADDR, 0).await;

    let validator = build_validator(&mock_server.uri());
    assert!(!validator.is_valid(DUMMY_BUYER_ADDR).await);
}

/// Test that a balance query failure is treated as invalid
/// Why: tolerance of query failure must not open the gate
#[tokio::test]
async fn test_query_failure_is_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let validator = build_validator(&mock_server.uri());
    assert!(!validator.is_valid(DUMMY_BUYER_ADDR).await);
}

/// Test that a JSON-RPC level error is treated as invalid
#[tokio::test]
async fn test_rpc_error_is_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "header not found" }
        })))
        .mount(&mock_server)
        .await;

    let validator = build_validator(&mock_server.uri());
    assert!(!validator.is_valid(DUMMY_BUYER_ADDR).await);
}
