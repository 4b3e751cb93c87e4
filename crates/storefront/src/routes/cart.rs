//! Cart routes. Every handler requires a logged-in user and only ever
//! touches that user's cart.
//!
//! Success responses for add and update are plain text; clients refetch
//! `GET /api/cart` afterwards to reconcile their local copy.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use vegi_shop_core::cart::{CartLine, MAX_LINE_QUANTITY};
use vegi_shop_core::{CartItemId, ProductId};
use vegi_shop_db::{CartRepository, ProductRepository, RepositoryError};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, json_int};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// The user's cart lines. Creates the cart on first access.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CartLine>>> {
    let lines = CartRepository::new(state.pool()).lines(user.id).await?;
    Ok(Json(lines))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<serde_json::Value>,
    pub quantity: Option<serde_json::Value>,
}

impl AddToCartRequest {
    /// Validate into `(product, quantity)`; quantity defaults to 1.
    fn validate(&self) -> Result<(ProductId, i32)> {
        let product_id = match &self.product_id {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(
                json_int(v, true)
                    .filter(|id| *id > 0)
                    .ok_or_else(|| AppError::BadRequest("Invalid product ID".to_string()))?,
            ),
        }
        .ok_or_else(|| AppError::BadRequest("Product ID is required".to_string()))?;

        let quantity = match &self.quantity {
            None | Some(serde_json::Value::Null) => 1,
            Some(v) => json_int(v, false)
                .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
                .ok_or_else(|| AppError::BadRequest("Invalid quantity".to_string()))?,
        };

        Ok((ProductId::new(product_id), quantity))
    }
}

/// Add a product; an existing line for it is incremented.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn add(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<&'static str> {
    let (product_id, quantity) = body.validate()?;

    if !ProductRepository::new(state.pool()).exists(product_id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    CartRepository::new(state.pool())
        .add_item(user.id, product_id, quantity)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(msg) => AppError::NotFound(msg),
            other => AppError::Database(other),
        })?;

    Ok("Item added to cart")
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: Option<serde_json::Value>,
}

impl UpdateCartItemRequest {
    /// A JSON integer in `0..=MAX_LINE_QUANTITY`. Zero removes the line.
    fn quantity(&self) -> Result<i32> {
        self.quantity
            .as_ref()
            .and_then(|v| json_int(v, false))
            .filter(|q| (0..=MAX_LINE_QUANTITY).contains(q))
            .ok_or_else(|| AppError::BadRequest("Invalid quantity".to_string()))
    }
}

/// Set a line's quantity. Concurrent updates are last-write-wins.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiPath(item_id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateCartItemRequest>,
) -> Result<&'static str> {
    let quantity = body.quantity()?;

    let updated = CartRepository::new(state.pool())
        .set_quantity(user.id, item_id, quantity)
        .await?;
    if !updated {
        return Err(AppError::NotFound("Cart item not found".to_string()));
    }

    Ok("Cart item updated")
}

#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn remove(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiPath(item_id): ApiPath<CartItemId>,
) -> Result<StatusCode> {
    let removed = CartRepository::new(state.pool())
        .remove_item(user.id, item_id)
        .await?;
    if !removed {
        return Err(AppError::NotFound("Cart item not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn add(body: serde_json::Value) -> Result<(ProductId, i32)> {
        serde_json::from_value::<AddToCartRequest>(body)
            .unwrap()
            .validate()
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_add_defaults_quantity_to_one() {
        assert_eq!(add(json!({"productId": 4})).unwrap(), (ProductId::new(4), 1));
        assert_eq!(
            add(json!({"productId": "9", "quantity": 3})).unwrap(),
            (ProductId::new(9), 3)
        );
    }

    #[test]
    fn test_add_requires_product_id() {
        assert_eq!(message(add(json!({})).unwrap_err()), "Product ID is required");
        assert_eq!(
            message(add(json!({"productId": null})).unwrap_err()),
            "Product ID is required"
        );
        assert_eq!(
            message(add(json!({"productId": "kale"})).unwrap_err()),
            "Invalid product ID"
        );
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        for q in [json!(0), json!(-2), json!(1.5), json!("2")] {
            assert_eq!(
                message(add(json!({"productId": 1, "quantity": q})).unwrap_err()),
                "Invalid quantity"
            );
        }
    }

    #[test]
    fn test_add_quantity_upper_bound() {
        assert_eq!(
            add(json!({"productId": 1, "quantity": 999})).unwrap(),
            (ProductId::new(1), 999)
        );
        for q in [json!(1000), json!(i32::MAX), json!(i64::from(i32::MAX) + 1)] {
            assert_eq!(
                message(add(json!({"productId": 1, "quantity": q})).unwrap_err()),
                "Invalid quantity"
            );
        }
    }

    #[test]
    fn test_update_quantity_validation() {
        let parse = |body: serde_json::Value| {
            serde_json::from_value::<UpdateCartItemRequest>(body)
                .unwrap()
                .quantity()
        };
        assert_eq!(parse(json!({"quantity": 0})).unwrap(), 0);
        assert_eq!(parse(json!({"quantity": 12})).unwrap(), 12);
        assert_eq!(parse(json!({"quantity": 999})).unwrap(), 999);
        for bad in [json!({}), json!({"quantity": -1}), json!({"quantity": 1000}), json!({"quantity": i32::MAX}), json!({"quantity": "3"}), json!({"quantity": 2.5})] {
            assert_eq!(message(parse(bad).unwrap_err()), "Invalid quantity");
        }
    }
}
