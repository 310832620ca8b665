//! Order Orchestrator Module
//!
//! This module drives the order state machine: it validates preconditions
//! against current on-chain contract state (through the escrow façade),
//! invokes the on-chain action, and commits the matching off-chain status
//! transition only after the chain reports success. A failed on-chain call
//! leaves the order in its prior state, retryable; there is no FAILED state.
//!
//! Single-order mutual exclusion: each order's mutating transitions run under
//! a per-order mutex held for the whole "read on-chain state -> decide ->
//! submit -> await receipt -> commit off-chain" region, so two concurrent
//! callers can never double-advance one order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{Result, SettlementError};
use crate::escrow::{EscrowContract, UnsignedTransaction};
use crate::storage::{Catalog, LineItem, Order, OrderStatus, OrderStore};

// ============================================================================
// ORDER ORCHESTRATOR IMPLEMENTATION
// ============================================================================

/// The order/contract synchronization engine's root component.
pub struct OrderOrchestrator {
    escrow: Arc<EscrowContract>,
    catalog: Arc<Catalog>,
    orders: Arc<OrderStore>,
    /// One mutex per order id, created lazily on first mutating access
    order_locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl OrderOrchestrator {
    /// Creates an orchestrator over the given façade, catalog, and store.
    pub fn new(escrow: Arc<EscrowContract>, catalog: Arc<Catalog>, orders: Arc<OrderStore>) -> Self {
        Self {
            escrow,
            catalog,
            orders,
            order_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an order: prices the line items from the catalog, deploys the
    /// escrow contract, and persists the record only once deployment has
    /// succeeded.
    ///
    /// All-or-nothing: if deployment fails (invalid address, revert,
    /// timeout), no order record is persisted and the same inputs can be
    /// retried without leaving orphans.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - id of the created order
    pub async fn create_order(
        &self,
        buyer: &str,
        line_items: Vec<LineItem>,
        buyer_address: &str,
    ) -> Result<u64> {
        let total_minor = self.total_price_minor(&line_items).await?;

        // Deploy first; the record is only observable with a backing contract.
        let contract_address = self.escrow.deploy(buyer_address, total_minor).await?;

        let order = self
            .orders
            .insert(buyer.to_string(), line_items, contract_address.clone())
            .await;

        info!(
            "Order {} created for {} (total {} minor units, contract {})",
            order.id, buyer, total_minor, contract_address
        );
        Ok(order.id)
    }

    /// Assigns a courier to an order and advances it CREATED -> PENDING.
    ///
    /// The off-chain status gate runs first; the façade then re-reads `paid`
    /// on-chain before submitting, so an unpaid contract fails with
    /// `PaymentIncomplete` and the order stays CREATED and retryable.
    pub async fn pick_up_order(&self, order_id: u64, courier_address: &str) -> Result<()> {
        let lock = self.lock_for(order_id).await;
        let _guard = lock.lock().await;

        let order = self.expect_status(order_id, OrderStatus::Created).await?;

        self.escrow
            .assign_courier(&order.contract_address, courier_address)
            .await?;

        self.orders
            .advance_status(order_id, OrderStatus::Pending)
            .await?;

        info!("Order {} picked up by courier {}", order_id, courier_address);
        Ok(())
    }

    /// Confirms delivery of an order and advances it PENDING -> COMPLETE.
    ///
    /// Rejects based on off-chain status first: a second confirmation of an
    /// already-COMPLETE order fails fast here without submitting a redundant
    /// chain transaction. The façade then re-reads `courier` on-chain before
    /// submitting.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - the confirmation transaction hash (settlement receipt)
    pub async fn confirm_delivery(&self, order_id: u64) -> Result<String> {
        let lock = self.lock_for(order_id).await;
        let _guard = lock.lock().await;

        let order = match self.orders.get(order_id).await {
            Some(order) => order,
            None => return Err(SettlementError::UnknownOrder(order_id)),
        };
        if order.status != OrderStatus::Pending {
            warn!(
                "Delivery confirmation rejected for order {}: status is {:?}",
                order_id, order.status
            );
            return Err(SettlementError::DeliveryNotReady);
        }

        let tx_hash = self.escrow.confirm_delivery(&order.contract_address).await?;

        self.orders
            .advance_status(order_id, OrderStatus::Complete)
            .await?;

        info!("Order {} complete: settlement tx {}", order_id, tx_hash);
        Ok(tx_hash)
    }

    /// Builds an unsigned payment invoice for an order.
    ///
    /// Read-only toward the order record; the price comes from the deployed
    /// contract, so catalog price changes after creation never leak into an
    /// existing order's invoice.
    pub async fn generate_invoice(
        &self,
        order_id: u64,
        buyer_address: &str,
    ) -> Result<UnsignedTransaction> {
        let order = self
            .orders
            .get(order_id)
            .await
            .ok_or(SettlementError::UnknownOrder(order_id))?;

        self.escrow
            .generate_invoice(&order.contract_address, buyer_address)
            .await
    }

    /// Returns the current off-chain record of an order.
    pub async fn get_order(&self, order_id: u64) -> Result<Order> {
        self.orders
            .get(order_id)
            .await
            .ok_or(SettlementError::UnknownOrder(order_id))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Sums catalog unit price x quantity over the line items, validating
    /// each reference and quantity and rejecting totals that overflow u64.
    async fn total_price_minor(&self, line_items: &[LineItem]) -> Result<u64> {
        if line_items.is_empty() {
            return Err(SettlementError::InvalidLineItem { index: 0 });
        }

        let mut total: u64 = 0;
        for (index, item) in line_items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(SettlementError::InvalidLineItem { index });
            }
            let unit_price = self.catalog.unit_price_minor(item.product_id).await?;
            // Checked: the total becomes the contract's immutable price, so
            // an overflow must surface as an error, never wrap
            total = unit_price
                .checked_mul(item.quantity as u64)
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or(SettlementError::InvalidLineItem { index })?;
        }
        Ok(total)
    }

    /// Fetches the order and checks it is in the expected status.
    async fn expect_status(&self, order_id: u64, status: OrderStatus) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await
            .ok_or(SettlementError::UnknownOrder(order_id))?;
        if order.status != status {
            return Err(SettlementError::UnknownOrder(order_id));
        }
        Ok(order)
    }

    /// Returns the mutex guarding this order id, creating it on first use.
    async fn lock_for(&self, order_id: u64) -> Arc<Mutex<()>> {
        let mut locks = self.order_locks.lock().await;
        locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
