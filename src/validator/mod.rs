//! Address Validator Module
//!
//! This module checks that chain addresses handed to the engine (buyer and
//! courier wallets) are syntactically well-formed and currently funded.
//!
//! The funding check is a sanity heuristic, not a security boundary: a
//! strictly positive balance is used as a liveness proxy to reject
//! placeholder and junk addresses before any gas is spent on them.

use std::sync::Arc;
use tracing::debug;

use crate::abi::is_well_formed_address;
use crate::evm_client::EvmClient;

/// Validates chain addresses against format and current funding.
pub struct AddressValidator {
    client: Arc<EvmClient>,
}

impl AddressValidator {
    /// Creates a new validator over the given chain client.
    pub fn new(client: Arc<EvmClient>) -> Self {
        Self { client }
    }

    /// Returns true if the address is well-formed and holds a strictly
    /// positive balance on the target chain.
    ///
    /// Fails closed: malformed addresses are rejected without a network
    /// call, a zero balance is rejected, and any query failure is treated
    /// as invalid.
    pub async fn is_valid(&self, address: &str) -> bool {
        if !is_well_formed_address(address) {
            debug!("Address {} rejected: malformed", address);
            return false;
        }

        match self.client.get_balance(address).await {
            Ok(balance) => {
                if balance == 0 {
                    debug!("Address {} rejected: zero balance", address);
                }
                balance > 0
            }
            Err(e) => {
                debug!("Address {} rejected: balance query failed: {}", address, e);
                false
            }
        }
    }
}
