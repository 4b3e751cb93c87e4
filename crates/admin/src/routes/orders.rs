//! Order management.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use vegi_shop_core::{OrderId, OrderStatus};
use vegi_shop_db::{AdminOrder, AdminOrderDetail, OrderRepository};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, non_blank};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
}

impl UpdateOrderRequest {
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a missing or unknown status.
    pub fn status(&self) -> Result<OrderStatus> {
        non_blank(self.status.as_deref())
            .ok_or_else(|| AppError::BadRequest("Status is required".to_string()))?
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid status".to_string()))
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// Every order, newest first, with customer details and lines.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<AdminOrder>>> {
    Ok(Json(OrderRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<AdminOrderDetail>> {
    OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(state, admin, body))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<UpdateOrderRequest>,
) -> Result<&'static str> {
    let status = body.status()?;

    if !OrderRepository::new(state.pool()).update_status(id, status).await? {
        return Err(not_found());
    }

    tracing::info!(order_id = %id, status = %status, admin_id = %admin.id, "Order status updated");
    Ok("Order updated successfully")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(status: Option<&str>) -> UpdateOrderRequest {
        UpdateOrderRequest {
            status: status.map(String::from),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(request(Some("shipped")).status().unwrap(), OrderStatus::Shipped);
        assert_eq!(request(Some(" cancelled ")).status().unwrap(), OrderStatus::Cancelled);
        assert_eq!(message(request(None).status().unwrap_err()), "Status is required");
        assert_eq!(message(request(Some("")).status().unwrap_err()), "Status is required");
        assert_eq!(message(request(Some("refunded")).status().unwrap_err()), "Invalid status");
    }
}
