//! Checkout and the customer's order history.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use vegi_shop_core::{OrderId, ShippingAddress};
use vegi_shop_db::{Order, OrderRepository};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: Option<ShippingAddress>,
}

impl CheckoutRequest {
    fn address(self) -> Result<ShippingAddress> {
        let address = self
            .shipping_address
            .ok_or_else(|| AppError::BadRequest("Shipping address is required".to_string()))?;
        let missing = address.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing shipping address fields: {}",
                missing.join(", ")
            )));
        }
        Ok(address)
    }
}

/// Turn the cart into a pending order.
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn checkout(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let address = body.address()?;
    let order = OrderRepository::new(state.pool())
        .checkout(user.id, &address)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The user's orders, newest first.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// One of the user's orders; other users' orders are reported missing.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(body: serde_json::Value) -> Result<ShippingAddress> {
        serde_json::from_value::<CheckoutRequest>(body).unwrap().address()
    }

    #[test]
    fn test_checkout_requires_address() {
        let err = parse(json!({})).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Shipping address is required"));
    }

    #[test]
    fn test_checkout_reports_blank_fields() {
        let err = parse(json!({"shippingAddress": {
            "street": "1 Orchard Way", "city": " ", "state": "CA", "zip": "", "country": "US"
        }}))
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Missing shipping address fields: city, zip"));
    }

    #[test]
    fn test_checkout_accepts_full_address() {
        let address = parse(json!({"shippingAddress": {
            "street": "1 Orchard Way", "city": "Fresno", "state": "CA", "zip": "93650", "country": "US"
        }}))
        .unwrap();
        assert_eq!(address.city, "Fresno");
    }
}
