//! Storage Module
//!
//! This module provides the off-chain order record store and the product
//! catalog seam. The order store is the system's relational half: it holds
//! one record per order, bound to exactly one escrow contract address, with
//! a monotonic status that only ever advances Created -> Pending -> Complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{Result, SettlementError};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Lifecycle status of an order. Monotonic; Complete is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Contract deployed, waiting for payment and courier pickup
    Created,
    /// Courier assigned, delivery under way
    Pending,
    /// Delivery confirmed, funds released (terminal)
    Complete,
}

impl OrderStatus {
    /// Returns the only status this one may advance to, if any.
    fn successor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Created => Some(OrderStatus::Pending),
            OrderStatus::Pending => Some(OrderStatus::Complete),
            OrderStatus::Complete => None,
        }
    }
}

/// One product line of an order. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product id
    pub product_id: u64,
    /// Ordered quantity, strictly positive
    pub quantity: u32,
}

/// Off-chain order record.
///
/// An order never exists without a deployed escrow contract backing it; the
/// contract address is set exactly once, at creation, and never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique id, assigned by the store on insert
    pub id: u64,
    /// Stable buyer identifier (e.g. verified email)
    pub buyer: String,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Ordered product lines
    pub line_items: Vec<LineItem>,
    /// Address of the escrow contract bound to this order
    pub contract_address: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Catalog product entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Unit price in minor currency units (e.g. cents)
    pub unit_price_minor: u64,
}

// ============================================================================
// ORDER STORE IMPLEMENTATION
// ============================================================================

/// In-memory store for order records.
///
/// HashMap keyed by order id, thread-safe via RwLock. Ids are assigned
/// sequentially on insert. Records are never deleted.
pub struct OrderStore {
    orders: RwLock<HashMap<u64, Order>>,
    next_id: RwLock<u64>,
}

impl OrderStore {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            next_id: RwLock::new(1),
        }
    }

    /// Inserts a new order record, assigning its id.
    ///
    /// Called only after the backing contract deployment has succeeded, so
    /// creation and deployment stay all-or-nothing from the caller's view.
    pub async fn insert(
        &self,
        buyer: String,
        line_items: Vec<LineItem>,
        contract_address: String,
    ) -> Order {
        let mut next_id = self.next_id.write().await;
        let id = *next_id;
        *next_id += 1;

        let order = Order {
            id,
            buyer,
            status: OrderStatus::Created,
            line_items,
            contract_address,
            created_at: Utc::now(),
        };

        let mut orders = self.orders.write().await;
        orders.insert(id, order.clone());
        order
    }

    /// Gets an order by id.
    pub async fn get(&self, id: u64) -> Option<Order> {
        let orders = self.orders.read().await;
        orders.get(&id).cloned()
    }

    /// Advances an order's status to `to`.
    ///
    /// Enforces monotonicity: the only legal moves are Created -> Pending and
    /// Pending -> Complete. Skips and regressions are rejected with
    /// `UnknownOrder`, leaving the record untouched.
    pub async fn advance_status(&self, id: u64, to: OrderStatus) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(SettlementError::UnknownOrder(id))?;

        match order.status.successor() {
            Some(next) if next == to => {
                order.status = to;
                Ok(())
            }
            _ => Err(SettlementError::UnknownOrder(id)),
        }
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PRODUCT CATALOG IMPLEMENTATION
// ============================================================================

/// In-memory product catalog.
///
/// Stands in for the relational catalog layer, which is an external
/// collaborator: the orchestrator only needs existence checks and unit price
/// lookups by id.
pub struct Catalog {
    products: RwLock<HashMap<u64, Product>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces a product.
    pub async fn upsert(&self, product: Product) {
        let mut products = self.products.write().await;
        products.insert(product.id, product);
    }

    /// Looks up a product's unit price in minor units.
    pub async fn unit_price_minor(&self, product_id: u64) -> Result<u64> {
        let products = self.products.read().await;
        products
            .get(&product_id)
            .map(|p| p.unit_price_minor)
            .ok_or(SettlementError::CatalogReference { product_id })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
