//! Chain Transaction Executor Module
//!
//! This module builds, signs, submits, and awaits finality for the operator's
//! chain transactions. It owns nonce sequencing for the operator account: the
//! operator is the shared signer for every order's deployment, courier
//! assignment, and delivery confirmation, so nonce fetch and submission are
//! serialized behind a single in-process lock. Callers never see or touch
//! nonces.

use std::sync::Arc;
use std::time::Duration;

use sha3::{Digest, Keccak256};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::abi::{rlp_encode_list, rlp_encode_u128, rlp_encode_u64};
use crate::config::Config;
use crate::crypto::OperatorSigner;
use crate::error::{Result, SettlementError};
use crate::evm_client::{EvmClient, TxReceipt};

// ============================================================================
// CALL REQUEST
// ============================================================================

/// An operator transaction to be built, signed, and submitted.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Destination contract address; `None` for a deployment
    pub to: Option<String>,
    /// Value transferred with the call, in wei
    pub value: u128,
    /// Calldata (selector + ABI-encoded arguments), or init code for a deployment
    pub data: Vec<u8>,
    /// Fixed gas budget for this operation; an underestimate surfaces as an
    /// explicit out-of-gas revert, never a silent partial state change
    pub gas_limit: u64,
}

// ============================================================================
// TRANSACTION EXECUTOR IMPLEMENTATION
// ============================================================================

/// Builds, signs and submits operator transactions and awaits their receipts.
pub struct TxExecutor {
    client: Arc<EvmClient>,
    signer: OperatorSigner,
    chain_id: u64,
    gas_price: u64,
    receipt_timeout: Duration,
    receipt_poll_interval: Duration,
    /// Serializes nonce fetch -> sign -> submit for the shared operator
    /// account. Two concurrent submissions racing for the same nonce would
    /// silently drop or replace one transaction.
    nonce_lock: Mutex<()>,
}

impl TxExecutor {
    /// Creates a new executor over the given client and operator signer.
    pub fn new(client: Arc<EvmClient>, signer: OperatorSigner, config: &Config) -> Self {
        Self {
            client,
            signer,
            chain_id: config.chain.chain_id,
            gas_price: config.chain.gas_price_wei,
            receipt_timeout: Duration::from_millis(config.chain.receipt_timeout_ms),
            receipt_poll_interval: Duration::from_millis(config.chain.receipt_poll_interval_ms),
            nonce_lock: Mutex::new(()),
        }
    }

    /// Returns the operator's Ethereum address.
    pub fn operator_address(&self) -> &str {
        self.signer.address()
    }

    /// Builds, signs, submits a transaction and blocks until it is mined or
    /// the receipt deadline elapses.
    ///
    /// The nonce is fetched fresh from the chain under the sequencer lock
    /// immediately before signing; the lock is released once the node has
    /// accepted the raw transaction, so independent submissions can await
    /// their receipts concurrently.
    ///
    /// # Returns
    ///
    /// * `Ok(TxReceipt)` - transaction mined successfully
    /// * `Err(ChainTransport)` - submission failed, safe to retry
    /// * `Err(ChainRevert)` - mined but rejected by contract logic
    /// * `Err(ChainTimeout)` - outcome unknown; re-read state before retrying
    pub async fn submit(&self, call: CallRequest) -> Result<TxReceipt> {
        let tx_hash = {
            let _guard = self.nonce_lock.lock().await;

            // Fresh nonce, never cached: the operator account is shared with
            // anything else submitting on its behalf.
            let nonce = self
                .client
                .get_transaction_count(self.signer.address())
                .await?;

            let raw_tx = self.build_signed_transaction(&call, nonce)?;

            debug!(
                "Submitting operator tx: nonce={}, to={:?}, gas_limit={}, value={}",
                nonce, call.to, call.gas_limit, call.value
            );

            self.client.send_raw_transaction(&raw_tx).await?
        };

        info!("Operator tx accepted: tx_hash={}", tx_hash);
        self.wait_for_receipt(&tx_hash).await
    }

    /// Polls for a transaction receipt until it appears or the deadline
    /// elapses.
    ///
    /// A timeout does NOT mean the transaction failed — it may still be mined
    /// later. Callers retrying after `ChainTimeout` must first re-read
    /// on-chain state to check whether the action already took effect.
    pub async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;

        loop {
            if let Some(receipt) = self.client.get_transaction_receipt(tx_hash).await? {
                let status = receipt.status.as_deref().unwrap_or("0x0");
                if status == "0x1" {
                    debug!("Receipt observed for {}: success", tx_hash);
                    return Ok(receipt);
                }
                warn!("Receipt observed for {}: reverted", tx_hash);
                return Err(SettlementError::ChainRevert {
                    tx_hash: tx_hash.to_string(),
                });
            }

            if tokio::time::Instant::now() + self.receipt_poll_interval > deadline {
                warn!("No receipt for {} within deadline", tx_hash);
                return Err(SettlementError::ChainTimeout {
                    tx_hash: tx_hash.to_string(),
                });
            }

            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    /// RLP-encodes and signs a legacy EIP-155 transaction.
    ///
    /// Unsigned form: [nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0].
    /// Signed form: [nonce, gasPrice, gasLimit, to, value, data, v, r, s]
    /// with v = recovery_id + chainId * 2 + 35.
    fn build_signed_transaction(&self, call: &CallRequest, nonce: u64) -> Result<String> {
        let to_bytes = match &call.to {
            Some(to) => crate::abi::address_bytes(to)?,
            // Deployment: empty `to` field, init code in `data`
            None => vec![],
        };

        let unsigned_items: Vec<Vec<u8>> = vec![
            rlp_encode_u64(nonce),
            rlp_encode_u64(self.gas_price),
            rlp_encode_u64(call.gas_limit),
            to_bytes.clone(),
            rlp_encode_u128(call.value),
            call.data.clone(),
            rlp_encode_u64(self.chain_id),
            vec![],
            vec![],
        ];
        let unsigned_rlp = rlp_encode_list(&unsigned_items);

        let mut hasher = Keccak256::new();
        hasher.update(&unsigned_rlp);
        let tx_hash: [u8; 32] = hasher.finalize().into();

        let (r, s, recovery_id) = self
            .signer
            .sign_transaction_hash(&tx_hash)
            .map_err(|e| SettlementError::ChainTransport(format!("Signing failed: {}", e)))?;

        let v = (recovery_id as u64) + self.chain_id * 2 + 35;

        let signed_items: Vec<Vec<u8>> = vec![
            rlp_encode_u64(nonce),
            rlp_encode_u64(self.gas_price),
            rlp_encode_u64(call.gas_limit),
            to_bytes,
            rlp_encode_u128(call.value),
            call.data.clone(),
            rlp_encode_u64(v),
            strip_leading_zeros(&r),
            strip_leading_zeros(&s),
        ];
        let signed_rlp = rlp_encode_list(&signed_items);

        Ok(format!("0x{}", hex::encode(signed_rlp)))
    }
}

/// RLP integer fields must not carry leading zero bytes; zero itself is the
/// empty byte string.
fn strip_leading_zeros(bytes: &[u8; 32]) -> Vec<u8> {
    match bytes.iter().position(|&b| b != 0) {
        Some(start) => bytes[start..].to_vec(),
        None => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::strip_leading_zeros;

    #[test]
    fn test_strip_leading_zeros() {
        let mut word = [0u8; 32];
        word[30] = 0x04;
        word[31] = 0x00;
        assert_eq!(strip_leading_zeros(&word), vec![0x04, 0x00]);

        assert_eq!(strip_leading_zeros(&[0u8; 32]), Vec::<u8>::new());

        let full = [0xffu8; 32];
        assert_eq!(strip_leading_zeros(&full).len(), 32);
    }
}
