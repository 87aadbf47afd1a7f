//! Order-item routes. All require authentication and act on the caller's
//! own rows.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use stockroom_core::{AddOrderItemRequest, OrderItemDetail, UpdateOrderItemRequest};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::services::order_item_service;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/add", post(add))
        .route("/update/{id}", put(update))
        .route("/delete/{id}", delete(remove))
}

async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<OrderItemDetail>>> {
    let items = order_item_service::list(&state.db, user.id()).await?;
    Ok(ApiResponse::ok(items, "Order items fetched successfully"))
}

async fn add(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddOrderItemRequest>,
) -> ApiResult<ApiResponse<OrderItemDetail>> {
    let item = order_item_service::add(&state.db, user.id(), body).await?;
    Ok(ApiResponse::created(item, "Order item added successfully"))
}

async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateOrderItemRequest>,
) -> ApiResult<ApiResponse<OrderItemDetail>> {
    let item = order_item_service::update_quantity(&state.db, user.id(), &id, body.quantity).await?;
    Ok(ApiResponse::ok(item, "Order item updated successfully"))
}

async fn remove(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    order_item_service::delete(&state.db, user.id(), &id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "Order item deleted successfully"))
}
