//! Shared test helpers
//!
//! This module provides constants and builders used across the integration
//! tests: dummy chain addresses, a test configuration pointing at a wiremock
//! server, a fully wired engine, and mount helpers for the JSON-RPC methods
//! the engine uses.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use escrow_settler::config::{ChainConfig, Config, EscrowConfig, OperatorConfig};
use escrow_settler::crypto::{address_for_private_key, OperatorSigner};
use escrow_settler::escrow::{EscrowArtifact, EscrowContract};
use escrow_settler::evm_client::EvmClient;
use escrow_settler::executor::TxExecutor;
use escrow_settler::orchestrator::OrderOrchestrator;
use escrow_settler::storage::{Catalog, OrderStore, Product};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Test operator private key (secp256k1 scalar 1; test-only, never fund it)
pub const DUMMY_OPERATOR_KEY: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000001";

/// Dummy buyer wallet address (EVM format, 20 bytes)
pub const DUMMY_BUYER_ADDR: &str = "0x00000000000000000000000000000000000000aa";

/// Dummy courier wallet address (EVM format, 20 bytes)
pub const DUMMY_COURIER_ADDR: &str = "0x00000000000000000000000000000000000000bb";

/// Dummy deployed escrow contract address (EVM format, 20 bytes)
pub const DUMMY_CONTRACT_ADDR: &str = "0x00000000000000000000000000000000000000cc";

/// Dummy transaction hash (64 hex characters)
pub const DUMMY_TX_HASH: &str =
    "0x00000000000000000000000000000000000000000000000000000000000000dd";

/// Dummy contract init code for deployment tests
pub const DUMMY_BYTECODE: &str = "0x60806040";

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Build a test configuration pointing at a mock JSON-RPC server.
pub fn build_test_config(rpc_url: &str) -> Config {
    build_test_config_with_timeout(rpc_url, 2_000)
}

/// Build a test configuration with a custom receipt deadline (ms).
pub fn build_test_config_with_timeout(rpc_url: &str, receipt_timeout_ms: u64) -> Config {
    Config {
        chain: ChainConfig {
            name: "Mock Chain".to_string(),
            rpc_url: rpc_url.to_string(),
            chain_id: 1337,
            gas_price_wei: 1_000_000_000,
            receipt_timeout_ms,
            receipt_poll_interval_ms: 50,
        },
        operator: OperatorConfig {
            private_key: DUMMY_OPERATOR_KEY.to_string(),
            address: address_for_private_key(DUMMY_OPERATOR_KEY).unwrap(),
        },
        escrow: EscrowConfig {
            artifact_path: "contracts/OrderEscrow.json".to_string(),
            price_scale: 1,
            deploy_gas_limit: 1_000_000,
            assign_gas_limit: 1_000_000,
            confirm_gas_limit: 150_000,
            pay_gas_limit: 200_000,
        },
    }
}

// ============================================================================
// ENGINE BUILDER
// ============================================================================

/// A fully wired engine over a mock chain, with handles to its stores.
pub struct TestEngine {
    pub orchestrator: OrderOrchestrator,
    pub escrow: Arc<EscrowContract>,
    pub catalog: Arc<Catalog>,
    pub orders: Arc<OrderStore>,
}

/// Build the full component stack from a test configuration.
pub fn build_test_engine(config: &Config) -> TestEngine {
    let client = Arc::new(EvmClient::new(&config.chain.rpc_url).unwrap());
    let signer = OperatorSigner::new(config).unwrap();
    let executor = Arc::new(TxExecutor::new(client.clone(), signer, config));
    let artifact = EscrowArtifact {
        bytecode: DUMMY_BYTECODE.to_string(),
    };
    let escrow = Arc::new(
        EscrowContract::new(
            executor,
            client,
            &artifact,
            &config.escrow,
            config.chain.gas_price_wei,
        )
        .unwrap(),
    );
    let catalog = Arc::new(Catalog::new());
    let orders = Arc::new(OrderStore::new());
    let orchestrator = OrderOrchestrator::new(escrow.clone(), catalog.clone(), orders.clone());

    TestEngine {
        orchestrator,
        escrow,
        catalog,
        orders,
    }
}

/// Seed the catalog with the standard two test products:
/// product 1 at 10.00 (1000 minor units), product 2 at 5.00 (500 minor units).
pub async fn seed_catalog(catalog: &Catalog) {
    catalog
        .upsert(Product {
            id: 1,
            name: "Product A".to_string(),
            unit_price_minor: 1_000,
        })
        .await;
    catalog
        .upsert(Product {
            id: 2,
            name: "Product B".to_string(),
            unit_price_minor: 500,
        })
        .await;
}

// ============================================================================
// ABI WORD HELPERS
// ============================================================================

/// ABI bool return word ("0x" + 64 hex chars).
pub fn bool_word(value: bool) -> String {
    format!("0x{:064x}", if value { 1u64 } else { 0u64 })
}

/// ABI uint256 return word.
pub fn u256_word(value: u128) -> String {
    format!("0x{:064x}", value)
}

/// ABI address return word (left-padded to 32 bytes).
pub fn address_word(address: &str) -> String {
    let clean = address.strip_prefix("0x").unwrap_or(address);
    format!("0x{:0>64}", clean)
}

// ============================================================================
// JSON-RPC MOCK MOUNTS
// ============================================================================

/// Mount an eth_getBalance mock for one address.
pub async fn mount_balance(server: &MockServer, address: &str, balance_wei: u128) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getBalance"})))
        .and(body_string_contains(address))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": format!("0x{:x}", balance_wei)
        })))
        .mount(server)
        .await;
}

/// Mount an eth_getTransactionCount mock (shared by all accounts).
pub async fn mount_transaction_count(server: &MockServer, nonce: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionCount"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": format!("0x{:x}", nonce)
        })))
        .mount(server)
        .await;
}

/// Mount an eth_call mock for one function selector.
pub async fn mount_call(server: &MockServer, selector: [u8; 4], result_word: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_call"})))
        .and(body_string_contains(&hex::encode(selector)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result_word
        })))
        .mount(server)
        .await;
}

/// Mount an eth_sendRawTransaction mock returning the dummy tx hash.
pub async fn mount_send_raw(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_sendRawTransaction"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": DUMMY_TX_HASH
        })))
        .mount(server)
        .await;
}

/// Mount an eth_sendRawTransaction mock with an expected call count,
/// verified when the mock server shuts down.
pub async fn mount_send_raw_expect(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_sendRawTransaction"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": DUMMY_TX_HASH
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mount an eth_getTransactionReceipt mock reporting success.
pub async fn mount_receipt_success(server: &MockServer, contract_address: Option<&str>) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "transactionHash": DUMMY_TX_HASH,
                "contractAddress": contract_address,
                "status": "0x1"
            }
        })))
        .mount(server)
        .await;
}

/// Mount an eth_getTransactionReceipt mock reporting a revert.
pub async fn mount_receipt_revert(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "transactionHash": DUMMY_TX_HASH,
                "contractAddress": null,
                "status": "0x0"
            }
        })))
        .mount(server)
        .await;
}

/// Mount an eth_getTransactionReceipt mock that never finds the transaction.
pub async fn mount_receipt_pending(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": null
        })))
        .mount(server)
        .await;
}
