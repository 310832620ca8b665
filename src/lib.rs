//! Escrow Settlement Engine Library
//!
//! This crate synchronizes off-chain marketplace order records with per-order
//! escrow contracts on an EVM chain: it deploys a contract per order, drives
//! it through courier assignment and delivery confirmation, and keeps the
//! order's status consistent with that on-chain truth.

pub mod abi;
pub mod config;
pub mod crypto;
pub mod error;
pub mod escrow;
pub mod evm_client;
pub mod executor;
pub mod orchestrator;
pub mod storage;
pub mod validator;

// Re-export commonly used types
pub use config::{ChainConfig, Config, EscrowConfig, OperatorConfig};
pub use crypto::OperatorSigner;
pub use error::{Result, SettlementError};
pub use escrow::{EscrowArtifact, EscrowContract, UnsignedTransaction};
pub use evm_client::{EvmClient, TxReceipt};
pub use executor::{CallRequest, TxExecutor};
pub use orchestrator::OrderOrchestrator;
pub use storage::{Catalog, LineItem, Order, OrderStatus, OrderStore, Product};
pub use validator::AddressValidator;
