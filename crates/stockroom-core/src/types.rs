//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   OrderItem     │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │◄──│  order_items[]  │       │
//! │  │  name (unique)  │   │  owner_id       │   │  customer_id    │       │
//! │  │  price_cents    │   │  quantity       │   │  total_cents    │       │
//! │  │  stock          │   │  price_cents    │   │  discount_id ───┼──┐    │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘  │    │
//! │                                                                    │    │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐  │    │
//! │  │  DiscountRate   │   │  OrderStatus    │   │  PaymentType    │  │    │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │  │    │
//! │  │  bps (u32)      │   │  PENDING        │   │  CASH           │  │    │
//! │  │  1000 = 10%     │   │  CONFIRMED      │   │  CARD           │  │    │
//! │  └─────────────────┘   │  CANCELLED      │   └─────────────────┘  │    │
//! │                        └─────────────────┘   ┌─────────────────┐  │    │
//! │                                              │    Discount     │◄─┘    │
//! │                                              │  code, pct      │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Every type serializes with camelCase field names. Money columns keep their
//! `Cents` suffix on the wire (`priceCents`, `discountedTotalCents`) so no
//! consumer ever mistakes an integer amount for a decimal one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// Discount codes are stored as whole percentages; the rate is widened to
/// basis points so the money math shares one rounding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a rate from a whole percentage (10 → 10%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        DiscountRate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product held in the stock ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across the catalog.
    pub name: String,

    /// Category this product belongs to.
    pub category_id: String,

    /// URL produced by the external image host.
    pub image_url: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether `quantity` units can be taken from the current stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        quantity <= self.stock
    }
}

/// A product joined with its category name, as returned by catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub product: Product,
    pub category_name: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// A registered customer account.
///
/// The password hash never leaves the server: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The public view of a user (no credentials).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A (customer, product) line awaiting or referenced by an order.
///
/// There is at most one open row per owner and product: adding the same
/// product again merges into it. Once an order claims the row it is frozen
/// and the next add starts a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    /// The user who created the line.
    pub owner_id: String,
    pub product_id: String,
    /// Always at least 1.
    pub quantity: i64,
    /// Unit price × quantity at the time of the last write.
    pub price_cents: i64,
    /// Set once an order claims the line; the line is read-only from then on.
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub ordered_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the line price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether an order already references this line.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.ordered_at.is_some()
    }
}

/// An order-item with its product populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Product,
}

// =============================================================================
// Discount
// =============================================================================

/// A percentage discount code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: String,
    /// Stored uppercased.
    pub code: String,
    /// Whole percentage, 1-100.
    pub percentage: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Returns the percentage as a rate in basis points.
    pub fn rate(&self) -> DiscountRate {
        DiscountRate::from_percent(self.percentage.clamp(0, 100) as u32)
    }

    /// A code can be redeemed while it is active and has not yet expired.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentType {
    Cash,
    Card,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order. Transitions are not restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    /// Status a new order starts in: paid orders are confirmed immediately.
    pub const fn initial(is_paid: bool) -> Self {
        if is_paid {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Pending
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order referencing previously upserted order-items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    /// Order-item ids, in submission order.
    pub order_items: Vec<String>,
    /// Pre-discount total.
    pub total_cents: i64,
    /// Post-discount total; equal to `total_cents` without a code.
    pub discounted_total_cents: i64,
    pub discount_id: Option<String>,
    pub payment_type: PaymentType,
    pub payment_id: Option<String>,
    pub status: OrderStatus,
    pub is_paid: bool,
    /// Key supplied by the checkout that created this order, if any.
    pub idempotency_key: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn discounted_total(&self) -> Money {
        Money::from_cents(self.discounted_total_cents)
    }
}

/// An order with customer, order-items (with products) and discount populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: String,
    pub customer: Option<PublicUser>,
    pub order_items: Vec<OrderItemDetail>,
    pub total_cents: i64,
    pub discounted_total_cents: i64,
    pub discount: Option<Discount>,
    pub payment_type: PaymentType,
    pub payment_id: Option<String>,
    pub status: OrderStatus,
    pub is_paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Request Payloads
// =============================================================================
// Shared by the API server (deserialize) and the client (serialize).

/// Body of `POST /orderItems/add`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddOrderItemRequest {
    pub product: String,
    /// Defaults to 1 when omitted.
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Body of `PUT /orderItems/update/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderItemRequest {
    pub quantity: i64,
}

/// Body of `POST /orders/add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub order_items: Vec<String>,
    #[serde(default)]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Body of `PUT /orders/update/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default)]
    pub payment_id: Option<String>,
}

/// Body of `PUT /orders/update-payment/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub is_paid: bool,
    #[serde(default)]
    pub payment_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discount(is_active: bool, expires_in: Duration) -> Discount {
        let now = Utc::now();
        Discount {
            id: "d-1".to_string(),
            code: "SAVE10".to_string(),
            percentage: 10,
            is_active,
            expires_at: now + expires_in,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_discount_rate_from_percent() {
        assert_eq!(DiscountRate::from_percent(10).bps(), 1000);
        assert_eq!(DiscountRate::from_percent(100).bps(), 10000);
    }

    #[test]
    fn test_discount_redeemable_window() {
        let now = Utc::now();
        assert!(discount(true, Duration::days(1)).is_redeemable(now));
        assert!(!discount(false, Duration::days(1)).is_redeemable(now));
        assert!(!discount(true, Duration::days(-1)).is_redeemable(now));
    }

    #[test]
    fn test_initial_status_follows_payment() {
        assert_eq!(OrderStatus::initial(true), OrderStatus::Confirmed);
        assert_eq!(OrderStatus::initial(false), OrderStatus::Pending);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentType::Card).unwrap(), "\"CARD\"");
        assert_eq!(
            serde_json::to_string(&OrderStatus::Confirmed).unwrap(),
            "\"CONFIRMED\""
        );
    }

    #[test]
    fn test_order_item_request_quantity_is_optional() {
        let req: AddOrderItemRequest = serde_json::from_str(r#"{"product":"p-1"}"#).unwrap();
        assert_eq!(req.product, "p-1");
        assert_eq!(req.quantity, None);
    }

    #[test]
    fn test_user_hides_password_hash() {
        let user = User {
            id: "u-1".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "secret".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }
}
