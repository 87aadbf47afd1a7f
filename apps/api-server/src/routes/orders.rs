//! Order routes. All require authentication.
//!
//! `POST /orders/add` answers 201 for a new order and 200 with the earlier
//! order when the idempotency key was already used.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use stockroom_core::{
    CreateOrderRequest, Order, OrderDetail, UpdateOrderRequest, UpdatePaymentRequest,
};
use stockroom_db::OrderCreation;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::services::order_service::{self, UpdateStatusRequest};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/add", post(create))
        .route("/update/{id}", put(update))
        .route("/update-status/{id}", put(update_status))
        .route("/update-payment/{id}", put(update_payment))
        .route("/delete/{id}", delete(remove))
        .route("/{id}", get(fetch))
}

async fn create(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> ApiResult<ApiResponse<Order>> {
    Ok(match order_service::create(&state.db, body).await? {
        OrderCreation::Created(order) => ApiResponse::created(order, "Order created successfully"),
        OrderCreation::Replayed(order) => ApiResponse::ok(order, "Order already created"),
    })
}

async fn list(
    _user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<OrderDetail>>> {
    let orders = order_service::list(&state.db).await?;
    Ok(ApiResponse::ok(orders, "All orders fetched successfully"))
}

async fn fetch(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<OrderDetail>> {
    let order = order_service::get(&state.db, &id).await?;
    Ok(ApiResponse::ok(order, "Order fetched successfully"))
}

async fn update(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateOrderRequest>,
) -> ApiResult<ApiResponse<Order>> {
    let order = order_service::update(&state.db, &id, body).await?;
    Ok(ApiResponse::ok(order, "Order updated successfully"))
}

async fn update_status(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> ApiResult<ApiResponse<Order>> {
    let order = order_service::update_status(&state.db, &id, body).await?;
    Ok(ApiResponse::ok(order, "Order status updated successfully"))
}

async fn update_payment(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdatePaymentRequest>,
) -> ApiResult<ApiResponse<Order>> {
    let order = order_service::update_payment(&state.db, &id, body).await?;
    Ok(ApiResponse::ok(order, "Order payment updated successfully"))
}

async fn remove(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Order>> {
    let order = order_service::delete(&state.db, &id).await?;
    Ok(ApiResponse::ok(order, "Order deleted successfully"))
}
