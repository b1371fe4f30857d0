//! HTTP surface: cart routes plus health and metrics endpoints.
//!
//! Every cart route answers HTTP 200 with an [`ApiResponse`] envelope; the
//! success flag and message carry the outcome, so callers are never aborted
//! ungracefully.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::error::{ApiResponse, CartError};
use crate::health;
use crate::metrics::METRICS;
use crate::model::{CartUpsert, CartView, QuantityChange};
use crate::state::AppState;

/// Cart payload accepted by the mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequestDto {
    pub cart_header: CartHeaderDto,
    #[serde(default)]
    pub cart_details: Vec<CartLineDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartHeaderDto {
    #[serde(default)]
    pub cart_header_id: u64,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Incoming line item. A nonzero `cart_line_id` means "set this row's count
/// absolutely"; zero or absent means "add to any existing row".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    #[serde(default)]
    pub cart_line_id: u64,
    pub product_id: u64,
    pub count: u32,
}

impl CartLineDto {
    fn to_change(&self) -> QuantityChange {
        if self.cart_line_id > 0 {
            QuantityChange::Set {
                line_id: self.cart_line_id,
                product_id: self.product_id,
                count: self.count,
            }
        } else {
            QuantityChange::Add {
                product_id: self.product_id,
                count: self.count,
            }
        }
    }
}

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/cart/{user_id}", get(get_cart))
        .route("/api/cart/{user_id}/count", get(get_cart_count))
        .route("/api/cart", post(upsert_cart))
        .route("/api/cart/remove", post(remove_line))
        .route("/api/cart/coupon", post(apply_coupon))
        .route("/api/cart/coupon/remove", post(remove_coupon))
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> (axum::http::StatusCode, String) {
    let metrics_text = METRICS.encode();
    (axum::http::StatusCode::OK, metrics_text)
}

fn envelope<T>(operation: &str, result: Result<T, CartError>) -> Json<ApiResponse<T>> {
    match result {
        Ok(value) => {
            METRICS.record_operation(operation, "success");
            Json(ApiResponse::ok(value))
        }
        Err(err) => {
            METRICS.record_operation(operation, err.category());
            error!(operation, error = %err, "cart operation failed");
            Json(ApiResponse::failure(err.to_string()))
        }
    }
}

async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<CartView>> {
    state.record_request();
    let result = state.service().cart_for_user(&user_id).await;
    envelope("get_cart", result)
}

async fn get_cart_count(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<usize>> {
    state.record_request();
    let result = state.service().count_items(&user_id);
    envelope("get_cart_count", result)
}

/// Stored row echoed back by the upsert endpoint. Product enrichment only
/// happens on cart reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLineDto {
    pub cart_line_id: u64,
    pub cart_header_id: u64,
    pub product_id: u64,
    pub count: u32,
}

async fn upsert_cart(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CartRequestDto>,
) -> Json<ApiResponse<StoredLineDto>> {
    state.record_request();

    let Some(item) = body.cart_details.first() else {
        METRICS.record_operation("upsert_cart", "validation");
        return Json(ApiResponse::failure("cart item is required"));
    };

    let request = CartUpsert {
        user_id: body.cart_header.user_id.clone(),
        coupon_code: body.cart_header.coupon_code.clone(),
        change: item.to_change(),
    };

    let result = state
        .service()
        .upsert_line(&request)
        .map(|line| StoredLineDto {
            cart_line_id: line.id,
            cart_header_id: line.header_id,
            product_id: line.product_id,
            count: line.count,
        });
    envelope("upsert_cart", result)
}

async fn remove_line(
    State(state): State<Arc<AppState>>,
    Json(line_id): Json<u64>,
) -> Json<ApiResponse<bool>> {
    state.record_request();
    let result = state.service().remove_line(line_id).map(|()| true);
    envelope("remove_line", result)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRemoveDto {
    pub user_id: String,
}

async fn apply_coupon(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CartRequestDto>,
) -> Json<ApiResponse<bool>> {
    state.record_request();
    let code = body.cart_header.coupon_code.clone().unwrap_or_default();
    let result = state
        .service()
        .apply_coupon(&body.cart_header.user_id, &code)
        .map(|()| true);
    envelope("apply_coupon", result)
}

async fn remove_coupon(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CouponRemoveDto>,
) -> Json<ApiResponse<bool>> {
    state.record_request();
    let result = state
        .service()
        .remove_coupon(&body.user_id)
        .map(|()| true);
    envelope("remove_coupon", result)
}
