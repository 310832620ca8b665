//! EVM Client Module
//!
//! This module provides a client for communicating with an EVM-compatible
//! blockchain node via its JSON-RPC API. It covers the read and submission
//! primitives the settlement engine needs: balance and nonce queries,
//! read-only contract calls, raw transaction submission, and receipt lookup.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SettlementError};

/// Per-request deadline for JSON-RPC round trips.
const RPC_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// API RESPONSE STRUCTURES
// ============================================================================

/// EVM JSON-RPC request wrapper
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<serde_json::Value>,
    id: u64,
}

/// EVM JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Receipt for a mined transaction.
///
/// `status` is "0x1" for success and "0x0" for a revert; `contract_address`
/// is populated only for deployment transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct TxReceipt {
    /// Hash of the mined transaction (JSON-RPC uses camelCase: transactionHash)
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    /// Address of the deployed contract, present on deployments only
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<String>,
    /// Execution status: "0x1" = success, "0x0" = revert
    pub status: Option<String>,
}

// ============================================================================
// EVM CLIENT IMPLEMENTATION
// ============================================================================

/// Client for communicating with an EVM-compatible node via JSON-RPC.
pub struct EvmClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL of the EVM node (e.g., "http://127.0.0.1:8545")
    rpc_url: String,
}

impl EvmClient {
    /// Creates a new EVM client for the given node URL.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SettlementError::ChainTransport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
        })
    }

    /// Queries the balance of an address in wei via eth_getBalance.
    pub async fn get_balance(&self, address: &str) -> Result<u128> {
        let balance_hex: String = self
            .json_rpc(
                "eth_getBalance",
                vec![serde_json::json!(address), serde_json::json!("latest")],
            )
            .await?;
        parse_hex_u128(&balance_hex, "balance")
    }

    /// Queries the pending-inclusive transaction count (next nonce) of an
    /// address via eth_getTransactionCount.
    ///
    /// Always fetched fresh from the chain; the client never caches or
    /// increments nonces locally.
    pub async fn get_transaction_count(&self, address: &str) -> Result<u64> {
        let nonce_hex: String = self
            .json_rpc(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await?;
        Ok(parse_hex_u128(&nonce_hex, "nonce")? as u64)
    }

    /// Executes a read-only contract call via eth_call against latest state.
    ///
    /// `data` is the full calldata (selector + encoded arguments); the result
    /// is the ABI-encoded return value as a hex string.
    pub async fn call(&self, to: &str, data: &[u8]) -> Result<String> {
        let data_hex = format!("0x{}", hex::encode(data));
        self.json_rpc(
            "eth_call",
            vec![
                serde_json::json!({
                    "to": to,
                    "data": data_hex,
                }),
                serde_json::json!("latest"),
            ],
        )
        .await
    }

    /// Submits a signed raw transaction via eth_sendRawTransaction.
    ///
    /// # Returns
    ///
    /// The transaction hash assigned by the node.
    pub async fn send_raw_transaction(&self, raw_tx: &str) -> Result<String> {
        self.json_rpc("eth_sendRawTransaction", vec![serde_json::json!(raw_tx)])
            .await
    }

    /// Fetches the receipt for a transaction via eth_getTransactionReceipt.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(TxReceipt))` - transaction has been mined
    /// * `Ok(None)` - transaction is pending or unknown
    pub async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>> {
        self.json_rpc("eth_getTransactionReceipt", vec![serde_json::json!(tx_hash)])
            .await
    }

    /// Generic JSON-RPC call helper.
    ///
    /// Transport failures, non-JSON responses, and RPC-level errors all map
    /// to `ChainTransport`: in every such case the requested action was not
    /// mined, so the caller may retry.
    async fn json_rpc<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        debug!("JSON-RPC {} -> {}", method, self.rpc_url);

        let rpc_future = async {
            let resp = self
                .client
                .post(&self.rpc_url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    SettlementError::ChainTransport(format!(
                        "Failed to send {} request to {}: {}",
                        method, self.rpc_url, e
                    ))
                })?;
            resp.json::<JsonRpcResponse<T>>().await.map_err(|e| {
                SettlementError::ChainTransport(format!(
                    "Failed to parse {} response from {}: {}",
                    method, self.rpc_url, e
                ))
            })
        };

        let response = tokio::time::timeout(RPC_TIMEOUT, rpc_future)
            .await
            .map_err(|_| {
                SettlementError::ChainTransport(format!(
                    "Timed out after {}s waiting for {} from {}",
                    RPC_TIMEOUT.as_secs(),
                    method,
                    self.rpc_url
                ))
            })??;

        if let Some(error) = response.error {
            return Err(SettlementError::ChainTransport(format!(
                "JSON-RPC error from {} ({}): {} (code: {})",
                self.rpc_url, method, error.message, error.code
            )));
        }

        match response.result {
            Some(result) => Ok(result),
            // eth_getTransactionReceipt legitimately returns null while a
            // transaction is pending; serde maps that through Option<T>.
            None => serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                SettlementError::ChainTransport(format!("No result in {} response", method))
            }),
        }
    }
}

/// Parse a 0x-prefixed hex quantity into a u128.
fn parse_hex_u128(value: &str, what: &str) -> Result<u128> {
    let clean = value.strip_prefix("0x").unwrap_or(value);
    let trimmed = clean.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(trimmed, 16)
        .map_err(|e| SettlementError::ChainTransport(format!("Failed to parse {}: {}", what, e)))
}
