//! Escrow Contract Façade Module
//!
//! This module provides typed operations over one deployed escrow contract
//! instance: deployment, courier assignment, delivery confirmation, and
//! unsigned invoice generation. Every mutating decision re-reads the relevant
//! on-chain flag first — chain state can change between read and write, so a
//! stale read is allowed and a revert from the ledger remains the final
//! authority, but a read that already fails the precondition avoids wasting
//! gas on a call guaranteed to revert.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::abi::{
    decode_address, decode_bool, decode_u256, encode_address, encode_u256, selector, ZERO_ADDRESS,
};
use crate::config::EscrowConfig;
use crate::error::{Result, SettlementError};
use crate::evm_client::EvmClient;
use crate::executor::{CallRequest, TxExecutor};
use crate::validator::AddressValidator;

// ============================================================================
// CONTRACT ARTIFACT
// ============================================================================

/// Pre-built escrow contract artifact.
///
/// The contract source and its compilation toolchain are outside this
/// system; the deployable bytecode is assumed pre-built and shipped as a
/// static JSON artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct EscrowArtifact {
    /// Deployment init code, hex encoded (with or without 0x prefix)
    pub bytecode: String,
}

impl EscrowArtifact {
    /// Loads the artifact from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let artifact: EscrowArtifact = serde_json::from_str(&content)?;
        Ok(artifact)
    }

    /// Returns the init code as raw bytes.
    pub fn bytecode_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let clean = self.bytecode.strip_prefix("0x").unwrap_or(&self.bytecode);
        Ok(hex::decode(clean)?)
    }
}

// ============================================================================
// UNSIGNED INVOICE TRANSACTION
// ============================================================================

/// A payment transaction envelope without a signature.
///
/// Handed to the buyer's own wallet for authorization; this system never
/// signs or submits it. The payment only becomes observable later as
/// `paid == true` on the contract.
#[derive(Debug, Clone, Serialize)]
pub struct UnsignedTransaction {
    /// Buyer's address — the external signer
    pub from: String,
    /// Escrow contract address
    pub to: String,
    /// Payment value in chain units, read from the contract's stored price
    pub value: u128,
    /// Buyer's next account nonce
    pub nonce: u64,
    /// Fixed gas budget for the payment call
    pub gas: u64,
    /// Fixed gas price in wei
    #[serde(rename = "gasPrice")]
    pub gas_price: u64,
    /// Encoded `pay()` calldata, hex with 0x prefix
    pub data: String,
}

// ============================================================================
// ESCROW CONTRACT FAÇADE IMPLEMENTATION
// ============================================================================

/// Typed operations over escrow contract instances.
pub struct EscrowContract {
    executor: Arc<TxExecutor>,
    client: Arc<EvmClient>,
    validator: AddressValidator,
    bytecode: Vec<u8>,
    config: EscrowConfig,
    gas_price: u64,
}

impl EscrowContract {
    /// Creates the façade over the given executor, client, and artifact.
    pub fn new(
        executor: Arc<TxExecutor>,
        client: Arc<EvmClient>,
        artifact: &EscrowArtifact,
        config: &EscrowConfig,
        gas_price_wei: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            executor,
            validator: AddressValidator::new(client.clone()),
            client,
            bytecode: artifact.bytecode_bytes()?,
            config: config.clone(),
            gas_price: gas_price_wei,
        })
    }

    /// Deploys a fresh escrow contract bound to one order.
    ///
    /// Validates the payer address, converts the order total from catalog
    /// minor units to chain units with the configured fixed multiplier, and
    /// submits the deployment from the operator account.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - address of the deployed contract
    /// * `Err(_)` - validation, revert, or timeout; never a partial address
    pub async fn deploy(&self, payer_address: &str, total_minor_units: u64) -> Result<String> {
        if !self.validator.is_valid(payer_address).await {
            return Err(SettlementError::InvalidAddress(payer_address.to_string()));
        }

        let price = total_minor_units as u128 * self.config.price_scale as u128;

        // Init code = artifact bytecode + ABI-encoded constructor args
        // (address payer, uint256 price)
        let mut data = self.bytecode.clone();
        data.extend_from_slice(&encode_address(payer_address)?);
        data.extend_from_slice(&encode_u256(price));

        let receipt = self
            .executor
            .submit(CallRequest {
                to: None,
                value: 0,
                data,
                gas_limit: self.config.deploy_gas_limit,
            })
            .await?;

        let contract_address = receipt.contract_address.ok_or_else(|| {
            SettlementError::ChainTransport(format!(
                "Deployment receipt {} carries no contract address",
                receipt.transaction_hash
            ))
        })?;

        info!(
            "Escrow contract deployed at {} (price={} chain units)",
            contract_address, price
        );
        Ok(contract_address)
    }

    /// Assigns a courier to the escrow contract.
    ///
    /// Validates the courier address, re-reads `paid` from the chain, and
    /// refuses to submit while the buyer's payment has not been observed.
    pub async fn assign_courier(&self, contract_address: &str, courier_address: &str) -> Result<()> {
        if !self.validator.is_valid(courier_address).await {
            return Err(SettlementError::InvalidAddress(courier_address.to_string()));
        }

        if !self.paid(contract_address).await? {
            debug!(
                "Courier assignment refused for {}: payment not observed",
                contract_address
            );
            return Err(SettlementError::PaymentIncomplete);
        }

        let mut data = selector("assignCourier(address)").to_vec();
        data.extend_from_slice(&encode_address(courier_address)?);

        self.executor
            .submit(CallRequest {
                to: Some(contract_address.to_string()),
                value: 0,
                data,
                gas_limit: self.config.assign_gas_limit,
            })
            .await?;

        info!(
            "Courier {} assigned on contract {}",
            courier_address, contract_address
        );
        Ok(())
    }

    /// Confirms delivery on the escrow contract, releasing the held funds.
    ///
    /// Re-reads `courier` from the chain and refuses to submit while no
    /// courier is assigned.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - transaction hash, kept as the settlement receipt
    pub async fn confirm_delivery(&self, contract_address: &str) -> Result<String> {
        let courier = self.courier(contract_address).await?;
        if courier == ZERO_ADDRESS {
            debug!(
                "Delivery confirmation refused for {}: no courier assigned",
                contract_address
            );
            return Err(SettlementError::DeliveryNotReady);
        }

        let data = selector("confirmDelivery()").to_vec();

        let receipt = self
            .executor
            .submit(CallRequest {
                to: Some(contract_address.to_string()),
                value: 0,
                data,
                gas_limit: self.config.confirm_gas_limit,
            })
            .await?;

        info!(
            "Delivery confirmed on contract {}: tx_hash={}",
            contract_address, receipt.transaction_hash
        );
        Ok(receipt.transaction_hash)
    }

    /// Builds an unsigned `pay()` transaction for the buyer's wallet.
    ///
    /// Validates the payer address, refuses if the contract is already paid,
    /// and reads the price directly from the contract — the deployed price is
    /// the single source of truth, never an off-chain recomputation.
    pub async fn generate_invoice(
        &self,
        contract_address: &str,
        payer_address: &str,
    ) -> Result<UnsignedTransaction> {
        if !self.validator.is_valid(payer_address).await {
            return Err(SettlementError::InvalidAddress(payer_address.to_string()));
        }

        if self.paid(contract_address).await? {
            return Err(SettlementError::AlreadyPaid);
        }

        let price = self.price(contract_address).await?;
        let nonce = self.client.get_transaction_count(payer_address).await?;

        debug!(
            "Invoice generated for contract {}: value={}, payer nonce={}",
            contract_address, price, nonce
        );

        Ok(UnsignedTransaction {
            from: payer_address.to_string(),
            to: contract_address.to_string(),
            value: price,
            nonce,
            gas: self.config.pay_gas_limit,
            gas_price: self.gas_price,
            data: format!("0x{}", hex::encode(selector("pay()"))),
        })
    }

    // ------------------------------------------------------------------
    // On-chain state reads (no caching; every decision re-reads the chain)
    // ------------------------------------------------------------------

    /// Reads the contract's `paid` flag.
    pub async fn paid(&self, contract_address: &str) -> Result<bool> {
        let result = self
            .client
            .call(contract_address, &selector("paid()"))
            .await?;
        decode_bool(&result)
    }

    /// Reads the contract's `courier` address (zero address until assigned).
    pub async fn courier(&self, contract_address: &str) -> Result<String> {
        let result = self
            .client
            .call(contract_address, &selector("courier()"))
            .await?;
        decode_address(&result)
    }

    /// Reads the contract's immutable `price` in chain units.
    pub async fn price(&self, contract_address: &str) -> Result<u128> {
        let result = self
            .client
            .call(contract_address, &selector("price()"))
            .await?;
        decode_u256(&result)
    }
}
