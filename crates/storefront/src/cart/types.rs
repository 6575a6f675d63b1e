//! Cart line items and derived state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zapastyle_core::ProductId;

use crate::catalog::Product;

/// One distinct product in the cart.
///
/// This is also the persisted layout: `{productId, quantity, product, addedAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: u32,
    /// Snapshot taken when the line was created. Not used for pricing.
    pub product: Product,
    pub added_at: DateTime<Utc>,
}

/// Derived view of the cart handed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    pub items: Vec<CartLineItem>,
    /// Sum of quantities.
    pub count: u64,
    /// Sum of quantity times the current catalog price.
    pub total: Decimal,
}

impl CartState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Priced line of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Cart contents captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_number: String,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
}
