//! # HTTP Routes
//!
//! One module per resource, all mounted under `/api/v1`.
//!
//! ```text
//! /api/v1
//!   ├── /users        register, login (public) · me, logout
//!   ├── /categories   CRUD                                   [auth]
//!   ├── /products     reads (public) · writes                [auth]
//!   ├── /discounts    CRUD + apply                           [auth]
//!   ├── /orderItems   caller's lines, upsert                 [auth]
//!   ├── /orders       create, read, mutate, delete           [auth]
//!   └── /health       liveness + database check
//! ```
//!
//! Protected handlers take an [`AuthUser`](crate::auth::AuthUser) argument;
//! the extractor rejects the request with 401 before the handler runs.

use axum::extract::FromRequest;
use axum::Router;

use crate::error::ApiError;
use crate::AppState;

pub mod categories;
pub mod discounts;
pub mod health;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod users;

/// JSON body extractor whose rejections use the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Every resource router, ready to be nested under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::routes())
        .nest("/categories", categories::routes())
        .nest("/products", products::routes())
        .nest("/discounts", discounts::routes())
        .nest("/orderItems", order_items::routes())
        .nest("/orders", orders::routes())
        .merge(health::routes())
}
