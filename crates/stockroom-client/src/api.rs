//! # API Client
//!
//! Typed calls against the Stockroom REST API.
//!
//! ## Response Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reqwest::Response                                                      │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  { statusCode, data, message, success }                                 │
//! │     │                                                                   │
//! │     ├── success ──► data: T                                             │
//! │     └── failure ──► ClientError::Api { status, message }                │
//! │                                                                         │
//! │  POST /orders/add:  201 ──► new order   200 ──► replayed order          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stockroom_core::{
    AddOrderItemRequest, CreateOrderRequest, Order, OrderDetail, OrderItemDetail, Product,
    ProductListing, PublicUser, UpdateOrderItemRequest,
};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Order Backend
// =============================================================================

/// Result of submitting an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlacement {
    pub order: Order,
    /// The server already had an order for this idempotency key.
    pub replayed: bool,
}

/// The server calls checkout depends on.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn list_order_items(&self) -> ClientResult<Vec<OrderItemDetail>>;

    async fn add_order_item(&self, product_id: &str, quantity: i64) -> ClientResult<OrderItemDetail>;

    async fn update_order_item(&self, id: &str, quantity: i64) -> ClientResult<OrderItemDetail>;

    async fn delete_order_item(&self, id: &str) -> ClientResult<()>;

    async fn create_order(&self, request: CreateOrderRequest) -> ClientResult<OrderPlacement>;
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    success: bool,
}

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    email: &'a str,
    password: &'a str,
}

/// A logged-in session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: PublicUser,
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

// =============================================================================
// HTTP Client
// =============================================================================

/// reqwest-backed client for `/api/v1`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(HttpClient {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
        })
    }

    /// Same client, authenticated with `token`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<(StatusCode, T)> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        let data = decode(response).await?;
        Ok((status, data))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        debug!(path, "GET");
        let (_, data) = self.send(self.client.get(self.url(path))).await?;
        Ok(data)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<(StatusCode, T)> {
        debug!(path, "POST");
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        debug!(path, "PUT");
        let (_, data) = self.send(self.client.put(self.url(path)).json(body)).await?;
        Ok(data)
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    pub async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<PublicUser> {
        let body = Credentials {
            username: Some(username),
            email,
            password,
        };
        let (_, user) = self.post("/users/register", &body).await?;
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let body = Credentials {
            username: None,
            email,
            password,
        };
        let (_, session) = self.post("/users/login", &body).await?;
        Ok(session)
    }

    pub async fn me(&self) -> ClientResult<PublicUser> {
        self.get("/users/me").await
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    pub async fn list_products(&self) -> ClientResult<Vec<ProductListing>> {
        self.get("/products").await
    }

    /// Fetches the current product, e.g. to refresh a cart snapshot.
    pub async fn get_product(&self, id: &str) -> ClientResult<Product> {
        let listing: ProductListing = self.get(&format!("/products/{id}")).await?;
        Ok(listing.product)
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn list_orders(&self) -> ClientResult<Vec<OrderDetail>> {
        self.get("/orders").await
    }

    pub async fn get_order(&self, id: &str) -> ClientResult<OrderDetail> {
        self.get(&format!("/orders/{id}")).await
    }
}

#[async_trait]
impl OrderBackend for HttpClient {
    async fn list_order_items(&self) -> ClientResult<Vec<OrderItemDetail>> {
        self.get("/orderItems").await
    }

    async fn add_order_item(&self, product_id: &str, quantity: i64) -> ClientResult<OrderItemDetail> {
        let body = AddOrderItemRequest {
            product: product_id.to_string(),
            quantity: Some(quantity),
        };
        let (_, item) = self.post("/orderItems/add", &body).await?;
        Ok(item)
    }

    async fn update_order_item(&self, id: &str, quantity: i64) -> ClientResult<OrderItemDetail> {
        self.put(&format!("/orderItems/update/{id}"), &UpdateOrderItemRequest { quantity })
            .await
    }

    async fn delete_order_item(&self, id: &str) -> ClientResult<()> {
        debug!(id, "DELETE order item");
        let request = self.client.delete(self.url(&format!("/orderItems/delete/{id}")));
        let _: (StatusCode, serde_json::Value) = self.send(request).await?;
        Ok(())
    }

    async fn create_order(&self, request: CreateOrderRequest) -> ClientResult<OrderPlacement> {
        let (status, order) = self.post("/orders/add", &request).await?;
        Ok(OrderPlacement {
            order,
            replayed: status != StatusCode::CREATED,
        })
    }
}

/// Unwraps the response envelope.
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            })
        }
        Err(e) => return Err(ClientError::InvalidResponse(e.to_string())),
    };

    if !status.is_success() || !envelope.success {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: envelope.message,
        });
    }

    envelope
        .data
        .ok_or_else(|| ClientError::InvalidResponse(format!("no data in response: {}", envelope.message)))
}
