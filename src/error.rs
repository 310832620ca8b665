//! Settlement Error Taxonomy
//!
//! This module defines the error type shared by the chain layer and the order
//! orchestrator. Chain-layer errors surface to the orchestrator unchanged so
//! that callers can distinguish retryable transport failures from reverts and
//! from timeouts whose outcome is unknown.

use thiserror::Error;

/// Errors produced by the settlement engine.
///
/// The three chain variants carry distinct retry semantics:
/// `ChainTransport` means the transaction was never accepted and is safe to
/// retry; `ChainRevert` means it was mined and rejected by contract logic, so
/// retrying with the same inputs will fail again; `ChainTimeout` means the
/// outcome is unknown — the transaction may still be mined, so callers must
/// re-read on-chain state before retrying.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Address is malformed or holds no funds on the target chain
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Courier assignment requested before the buyer's payment was observed
    #[error("Transfer not complete.")]
    PaymentIncomplete,

    /// Delivery confirmation requested before a courier was assigned,
    /// or the order is not in a deliverable state
    #[error("Delivery not complete.")]
    DeliveryNotReady,

    /// Invoice requested for a contract that is already paid
    #[error("Transfer already complete.")]
    AlreadyPaid,

    /// Network or submission failure; the transaction was not accepted
    #[error("Chain transport error: {0}")]
    ChainTransport(String),

    /// Transaction was mined but rejected by contract logic
    #[error("Transaction {tx_hash} reverted on chain")]
    ChainRevert { tx_hash: String },

    /// No receipt observed within the deadline; outcome unknown
    #[error("Timed out waiting for receipt of {tx_hash}")]
    ChainTimeout { tx_hash: String },

    /// Order line item references a product the catalog does not know
    #[error("Unknown product id {product_id}")]
    CatalogReference { product_id: u64 },

    /// Order line item carries a non-positive quantity
    #[error("Invalid quantity for line item {index}")]
    InvalidLineItem { index: usize },

    /// No order with this id, or the order is not in the expected state
    #[error("Invalid order id {0}")]
    UnknownOrder(u64),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SettlementError>;
