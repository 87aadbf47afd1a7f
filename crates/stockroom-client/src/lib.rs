//! # stockroom-client: Cart and Checkout
//!
//! Client side of the order workflow: a persisted cart, a typed HTTP client
//! and the checkout saga that turns the cart into an order.
//!
//! ## Modules
//! - [`store`] - `CartStore` with file or in-memory persistence
//! - [`api`] - `HttpClient` and the `OrderBackend` trait checkout runs against
//! - [`checkout`] - `CheckoutSaga` with compensation and idempotency key
//! - [`config`] - `ClientConfig` from environment
//! - [`error`] - `ClientError`
//!
//! ## Example
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let client = HttpClient::new(&config)?;
//! let mut store = CartStore::open(FileStorage::new(config.resolved_cart_path()?));
//!
//! store.add(client.get_product(&product_id).await?, 3)?;
//!
//! let mut saga = CheckoutSaga::new(client);
//! let order = saga.run(&mut store, CheckoutRequest {
//!     customer_id,
//!     payment_type: PaymentType::Card,
//!     is_paid: true,
//!     discount_code: Some("SAVE10".into()),
//! }).await?;
//! ```

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod store;

pub use api::{HttpClient, OrderBackend, OrderPlacement, Session};
pub use checkout::{CheckoutRequest, CheckoutSaga};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use store::{CartStorage, CartStore, FileStorage, MemoryStorage};
