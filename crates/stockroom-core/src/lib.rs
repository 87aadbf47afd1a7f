//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate is the **heart** of Stockroom. It contains the order and cart
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                stockroom-client (cart + checkout)               │   │
//! │  │    Cart store ──► Checkout saga ──► HTTP client                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    API Server (axum)                            │   │
//! │  │    order-items, orders, discounts, catalog                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ discount  │  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │  resolve  │  │   │
//! │  │   │  Order    │  │  Discount │  │ CartLine  │  │  apply    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockroom-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, OrderItem, Order, Discount, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart value type and its pure transition function
//! - [`discount`] - Discount code resolution and order total math
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::types::DiscountRate;
//!
//! let total = Money::from_cents(6000); // $60.00
//! let rate = DiscountRate::from_percent(10);
//!
//! assert_eq!(total.apply_percentage_discount(rate.bps()).cents(), 5400);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartAction, CartLine};
pub use error::{CartError, CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Quantity used when an order-item request does not name one.
pub const DEFAULT_ORDER_ITEM_QUANTITY: i64 = 1;

/// Smallest discount percentage a code may carry.
pub const MIN_DISCOUNT_PERCENT: i64 = 1;

/// Largest discount percentage a code may carry (free order).
pub const MAX_DISCOUNT_PERCENT: i64 = 100;

/// Largest unit price accepted for a product, in cents ($100,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Largest stock level accepted for a product.
pub const MAX_STOCK: i64 = 1_000_000;

/// Largest quantity accepted on a single order-item or cart line.
pub const MAX_QUANTITY: i64 = MAX_STOCK;
