//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the escrow
//! settlement engine. Configuration includes the chain endpoint, the operator
//! account, gas budgets, and the escrow contract artifact location.

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all engine settings.
///
/// This structure holds configuration for:
/// - Target chain connection details and gas price policy
/// - Operator account (signing key and expected address)
/// - Escrow contract artifact, price scaling, and per-operation gas budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target chain configuration (where escrow contracts are deployed)
    pub chain: ChainConfig,
    /// Operator account configuration (shared signer for all orders)
    pub operator: OperatorConfig,
    /// Escrow contract configuration (artifact, price scale, gas budgets)
    pub escrow: EscrowConfig,
}

/// Configuration for the target EVM chain connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Human-readable name for the chain
    pub name: String,
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Chain ID used for EIP-155 replay protection
    pub chain_id: u64,
    /// Fixed gas price in wei (no dynamic estimation is attempted)
    pub gas_price_wei: u64,
    /// Deadline for observing a transaction receipt, in milliseconds
    pub receipt_timeout_ms: u64,
    /// Interval between receipt polls, in milliseconds
    pub receipt_poll_interval_ms: u64,
}

/// Operator account configuration.
///
/// The operator is the chain identity the engine itself signs with: it pays
/// for contract deployment, courier assignment, and delivery confirmation.
/// The private key must be kept secure and never logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// secp256k1 private key, hex encoded (with or without 0x prefix)
    pub private_key: String,
    /// Expected operator address; cross-checked against the key at startup
    pub address: String,
}

/// Escrow contract configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Path to the pre-built contract artifact (JSON with a `bytecode` field)
    pub artifact_path: String,
    /// Multiplier from catalog minor units to the chain's value unit
    pub price_scale: u64,
    /// Gas budget for contract deployment
    pub deploy_gas_limit: u64,
    /// Gas budget for the courier assignment call
    pub assign_gas_limit: u64,
    /// Gas budget for the delivery confirmation call
    pub confirm_gas_limit: u64,
    /// Gas budget quoted on generated payment invoices
    pub pay_gas_limit: u64,
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Loads configuration from the TOML file.
    ///
    /// The path defaults to `config/settler.toml` and can be overridden with
    /// the `SETTLER_CONFIG_PATH` environment variable (used by tests).
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded configuration
    /// - `Err(anyhow::Error)` - Failed to load configuration or file doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("SETTLER_CONFIG_PATH")
            .unwrap_or_else(|_| "config/settler.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/settler.template.toml config/settler.toml\n\
                Then edit config/settler.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Creates a default configuration with placeholder values.
    ///
    /// This configuration is suitable for local development against a dev
    /// chain (e.g. Ganache/Hardhat). For production use, the placeholder key
    /// and address must be replaced with actual values.
    pub fn default() -> Self {
        Self {
            chain: ChainConfig {
                name: "Local Dev Chain".to_string(),
                rpc_url: "http://127.0.0.1:8545".to_string(),
                chain_id: 1337,
                gas_price_wei: 1_000_000_000,
                receipt_timeout_ms: 30_000,
                receipt_poll_interval_ms: 500,
            },
            operator: OperatorConfig {
                private_key: "REPLACE_WITH_PRIVATE_KEY".to_string(),
                address: "REPLACE_WITH_OPERATOR_ADDRESS".to_string(),
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
}
