//! Client-side cart context.
//!
//! Wraps an [`OptimisticCart`] and the storefront API. Each action mutates
//! the local cart first, then sends the request. Add and quantity changes
//! refetch the server cart on success; a removal trusts the local state.
//! Any failed request restores the pre-action cart and returns the error.
//! A refetch that fails after a successful request is logged and leaves the
//! context [stale](CartContext::is_stale) until the next successful refresh.

use vegi_shop_core::cart::{CartError, CartLine, CartMutation, OptimisticCart};
use vegi_shop_core::{CartItemId, ProductId};

use crate::{ClientError, StorefrontClient};

impl From<ClientError> for CartError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, message } => Self::Rejected {
                status: status.as_u16(),
                message,
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// The shopper's cart as a UI would hold it.
#[derive(Debug)]
pub struct CartContext<'a> {
    client: &'a StorefrontClient,
    cart: OptimisticCart,
    stale: bool,
}

impl<'a> CartContext<'a> {
    /// An empty context. Call [`refresh`](Self::refresh) to load the cart.
    #[must_use]
    pub fn new(client: &'a StorefrontClient) -> Self {
        Self {
            client,
            cart: OptimisticCart::default(),
            stale: false,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &OptimisticCart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        self.cart.items()
    }

    /// `true` when a mutation went through but the refetch that should have
    /// confirmed it failed, so the local cart may differ from the server's.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the local cart with the server's. A signed-out shopper (401)
    /// gets an empty cart rather than an error.
    ///
    /// # Errors
    ///
    /// Returns the error of any other failed fetch; local state is kept.
    pub async fn refresh(&mut self) -> Result<(), CartError> {
        match self.client.cart().await {
            Ok(lines) => {
                self.cart.reconcile(lines);
                self.stale = false;
                Ok(())
            }
            Err(err) if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) => {
                self.cart.clear();
                self.stale = false;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns the request error after restoring the previous cart.
    pub async fn add_to_cart(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let snapshot = self.cart.begin(CartMutation::Add { product_id });
        if let Err(err) = self.client.add_to_cart(product_id, 1).await {
            self.cart.rollback(snapshot);
            return Err(err.into());
        }
        self.refresh_after_success().await;
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns the request error after restoring the previous cart.
    pub async fn update_quantity(&mut self, item_id: CartItemId, quantity: i32) -> Result<(), CartError> {
        let snapshot = self.cart.begin(CartMutation::SetQuantity { item_id, quantity });
        if let Err(err) = self.client.update_cart_item(item_id, quantity).await {
            self.cart.rollback(snapshot);
            return Err(err.into());
        }
        self.refresh_after_success().await;
        Ok(())
    }

    /// Remove a line. The local removal stands on success, no refetch.
    ///
    /// # Errors
    ///
    /// Returns the request error after restoring the previous cart.
    pub async fn remove_item(&mut self, item_id: CartItemId) -> Result<(), CartError> {
        let snapshot = self.cart.begin(CartMutation::Remove { item_id });
        if let Err(err) = self.client.remove_cart_item(item_id).await {
            self.cart.rollback(snapshot);
            return Err(err.into());
        }
        Ok(())
    }

    /// The mutation already succeeded, so a failed refetch keeps the
    /// optimistic state and marks it stale instead of failing the action.
    async fn refresh_after_success(&mut self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!(error = %err, "Cart refetch failed; local cart is stale");
            self.stale = true;
        }
    }
}
