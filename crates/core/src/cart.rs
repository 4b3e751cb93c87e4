//! Cart lines and the optimistic cart state machine.
//!
//! The server-side cart is the source of truth. Clients keep a local copy
//! that is mutated immediately when the shopper acts, then corrected by
//! refetching the server cart. If the request fails, the local copy is put
//! back exactly as it was before the mutation.
//!
//! ```
//! use vegi_shop_core::cart::{CartMutation, OptimisticCart};
//! use vegi_shop_core::CartItemId;
//!
//! let mut cart = OptimisticCart::default();
//! let snapshot = cart.begin(CartMutation::Remove { item_id: CartItemId::new(1) });
//! // request failed
//! cart.rollback(snapshot);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, Price, ProductId, ProductImage};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// One cart line as served by `GET /api/cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub old_price: Option<Price>,
    pub quantity: i32,
    pub category_name: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl CartLine {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.line_total(self.quantity)
    }
}

/// A change the shopper requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMutation {
    /// Add one unit of a product. The line id is assigned by the server, so
    /// nothing changes locally until the refetch.
    Add { product_id: ProductId },
    /// Set a line's quantity. Zero removes the line.
    SetQuantity { item_id: CartItemId, quantity: i32 },
    /// Remove a line.
    Remove { item_id: CartItemId },
}

/// Local cart state taken before an optimistic mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a snapshot must be kept to roll back a failed mutation"]
pub struct CartSnapshot(Vec<CartLine>);

/// Errors surfaced by cart clients.
#[derive(thiserror::Error, Debug)]
pub enum CartError {
    /// The server answered with a non-success status.
    #[error("cart request failed with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The request never produced a response.
    #[error("cart request failed: {0}")]
    Transport(String),
}

/// The client's local view of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimisticCart {
    items: Vec<CartLine>,
}

impl OptimisticCart {
    #[must_use]
    pub fn new(items: Vec<CartLine>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    /// Find a line by id.
    #[must_use]
    pub fn line(&self, item_id: CartItemId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.id == item_id)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Apply `mutation` locally and return the state from before it.
    pub fn begin(&mut self, mutation: CartMutation) -> CartSnapshot {
        let snapshot = CartSnapshot(self.items.clone());
        match mutation {
            CartMutation::Add { .. } => {}
            CartMutation::SetQuantity { item_id, quantity } if quantity <= 0 => {
                self.items.retain(|line| line.id != item_id);
            }
            CartMutation::SetQuantity { item_id, quantity } => {
                if let Some(line) = self.items.iter_mut().find(|line| line.id == item_id) {
                    line.quantity = quantity;
                }
            }
            CartMutation::Remove { item_id } => {
                self.items.retain(|line| line.id != item_id);
            }
        }
        snapshot
    }

    /// Restore the state captured by [`begin`](Self::begin).
    pub fn rollback(&mut self, snapshot: CartSnapshot) {
        self.items = snapshot.0;
    }

    /// Replace local state with the server's copy.
    pub fn reconcile(&mut self, server_items: Vec<CartLine>) {
        self.items = server_items;
    }

    /// Drop all lines (signed-out state).
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
