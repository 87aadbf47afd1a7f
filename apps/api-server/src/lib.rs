//! # Stockroom API
//!
//! REST server for the catalog, order-items and orders.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stockroom API                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Router (/api/v1)         TraceLayer · CorsLayer                 │  │
//! │  │  users · categories · products · discounts · orderItems · orders │  │
//! │  └───────────────────────────────┬──────────────────────────────────┘  │
//! │                                  │ AuthUser (JWT)                       │
//! │                                  ▼                                      │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ order_item_svc │  │ discount_svc   │  │ order_service              ││
//! │  │ upsert ≤ stock │  │ code → totals  │  │ create + stock decrement   ││
//! │  └───────┬────────┘  └───────┬────────┘  └─────────────┬──────────────┘│
//! │          └───────────────────┼─────────────────────────┘               │
//! │                              ▼                                          │
//! │                   stockroom-db (SQLite via sqlx)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 8000)
//! - `BIND_ADDR` - listen address (default: 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default: ./stockroom.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 86400)
//! - `CORS_ORIGIN` - allowed browser origin (default: http://localhost:5173)

pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use stockroom_db::Database;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::JwtManager;
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(%origin, "CORS_ORIGIN is not a valid header value, cross-origin requests disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use stockroom_db::DbConfig;
    use tower::ServiceExt;

    async fn app() -> (Router, AppState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, ServerConfig::for_tests());
        (build_router(state.clone()), state)
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(app: &Router) -> (String, String) {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/users/register",
            None,
            json!({ "username": "ada", "email": "ada@example.com", "password": "correct horse" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app,
            "POST",
            "/api/v1/users/login",
            None,
            json!({ "email": "ada@example.com", "password": "correct horse" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (body["data"]["accessToken"].as_str().unwrap().to_string(), user_id)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app().await;
        let (status, body) = send(&app, "GET", "/api/v1/health", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["database"], true);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let (app, _) = app().await;

        let (status, body) = send(&app, "GET", "/api/v1/orders", None, Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 401);
        assert!(body["data"].is_null());

        let (status, _) = send(&app, "GET", "/api/v1/users/me", Some("garbage"), Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Product reads are public
        let (status, _) = send(&app, "GET", "/api/v1/products", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_rejected() {
        let (app, state) = app().await;
        let token = state.jwt.generate_access_token("no-such-user").unwrap();
        let (status, _) = send(&app, "GET", "/api/v1/users/me", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cookie_token_is_accepted() {
        let (app, _) = app().await;
        let (token, user_id) = login(&app).await;

        let request = Request::builder()
            .uri("/api/v1/users/me")
            .header("cookie", format!("accessToken={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["id"], user_id.as_str());
    }

    #[tokio::test]
    async fn test_catalog_and_order_over_http() {
        let (app, _) = app().await;
        let (token, user_id) = login(&app).await;
        let token = Some(token.as_str());

        let (status, body) = send(&app, "POST", "/api/v1/categories/create-category", token, json!({ "name": "Tools" })).await;
        assert_eq!(status, StatusCode::CREATED);
        let category = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "POST", "/api/v1/categories/create-category", token, json!({ "name": "Tools" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/products/create-product",
            token,
            json!({
                "name": "Hammer",
                "category": category,
                "image": "https://img.example.com/hammer.jpg",
                "priceCents": 2000,
                "stock": 10
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let product = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "POST", "/api/v1/orderItems/add", token, json!({ "product": product, "quantity": 11 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Quantity exceeds stock");

        let (status, body) = send(&app, "POST", "/api/v1/orderItems/add", token, json!({ "product": product, "quantity": 3 })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["priceCents"], 6000);
        assert_eq!(body["data"]["product"]["name"], "Hammer");
        let item = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/orders/add",
            token,
            json!({
                "customer": user_id,
                "orderItems": [item],
                "totalCents": 6000,
                "paymentType": "CARD",
                "isPaid": true
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "CONFIRMED");
        assert_eq!(body["data"]["discountedTotalCents"], 6000);

        let (_, body) = send(&app, "GET", &format!("/api/v1/products/{product}"), None, Value::Null).await;
        assert_eq!(body["data"]["stock"], 7);
        assert_eq!(body["data"]["categoryName"], "Tools");

        // The ordered item and its product are locked in by the order
        let (status, body) = send(&app, "PUT", &format!("/api/v1/orderItems/update/{item}"), token, json!({ "quantity": 5 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Order item is part of an order");

        let (status, body) = send(&app, "DELETE", &format!("/api/v1/products/delete-product/{product}"), token, Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Product is part of an order");

        let (status, _) = send(&app, "GET", &format!("/api/v1/products/{product}"), None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_fields_and_bad_json() {
        let (app, _) = app().await;
        let (token, _) = login(&app).await;

        let (status, body) = send(&app, "POST", "/api/v1/orders/add", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please provide all required fields");

        let (status, body) = send(&app, "POST", "/api/v1/orderItems/add", Some(&token), json!({ "quantity": "three" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
