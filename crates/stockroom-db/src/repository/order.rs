//! # Order Repository
//!
//! Orders and the transaction that turns order-items into committed stock
//! movements.
//!
//! ## Order Creation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(new_order)                                                      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── idempotency key seen before? ──► return existing (Replayed)     │
//! │    │                                                                    │
//! │    ├── INSERT INTO orders                                              │
//! │    │                                                                    │
//! │    ├── for each distinct order-item id (first occurrence wins):        │
//! │    │     ├── SELECT order_items       ── missing?  ──► ROLLBACK (404)  │
//! │    │     │                            ── ordered?  ──► ROLLBACK (400)  │
//! │    │     ├── UPDATE order_items SET ordered_at = now                   │
//! │    │     ├── INSERT INTO order_lines                                   │
//! │    │     └── UPDATE products                                           │
//! │    │           SET stock = stock - qty                                 │
//! │    │           WHERE id = ? AND stock >= qty                           │
//! │    │                     └── 0 rows? ──► ROLLBACK (insufficient stock) │
//! │    │                                                                    │
//! │  COMMIT ──► Created(order)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement inside the transaction runs on the transaction's own
//! connection. Dropping the transaction without committing rolls it back.
//!
//! A claimed order-item belongs to its order for good, so each row's
//! quantity is decremented from stock exactly once.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockroom_core::{
    CoreError, Order, OrderDetail, OrderStatus, PaymentType, PublicUser,
};
use tracing::{debug, info, warn};

use super::discount::DiscountRepository;
use super::generate_id;
use super::order_item::OrderItemRepository;
use super::user::UserRepository;
use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = r#"
    id, customer_id, total_cents, discounted_total_cents, discount_id,
    payment_type, payment_id, status, is_paid, idempotency_key,
    created_at, updated_at
"#;

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// A fully resolved order, ready to persist.
///
/// Totals and status are computed by the caller; this repository does not
/// apply discounts.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: String,
    pub order_item_ids: Vec<String>,
    pub total_cents: i64,
    pub discounted_total_cents: i64,
    pub discount_id: Option<String>,
    pub payment_type: PaymentType,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub idempotency_key: Option<String>,
}

/// Partial order update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub is_paid: Option<bool>,
    pub payment_id: Option<String>,
}

/// Outcome of [`OrderRepository::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrderCreation {
    /// A new order was written and stock decremented.
    Created(Order),
    /// The idempotency key matched an earlier order; nothing was written.
    Replayed(Order),
}

impl OrderCreation {
    pub fn order(&self) -> &Order {
        match self {
            OrderCreation::Created(order) | OrderCreation::Replayed(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            OrderCreation::Created(order) | OrderCreation::Replayed(order) => order,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, OrderCreation::Replayed(_))
    }
}

/// Row shape of the `orders` table; the item list lives in `order_lines`.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer_id: String,
    total_cents: i64,
    discounted_total_cents: i64,
    discount_id: Option<String>,
    payment_type: PaymentType,
    payment_id: Option<String>,
    status: OrderStatus,
    is_paid: bool,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<String>) -> Order {
        Order {
            id: self.id,
            customer_id: self.customer_id,
            order_items,
            total_cents: self.total_cents,
            discounted_total_cents: self.discounted_total_cents,
            discount_id: self.discount_id,
            payment_type: self.payment_type,
            payment_id: self.payment_id,
            status: self.status,
            is_paid: self.is_paid,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Line of an order-item as seen by the stock decrement.
#[derive(Debug, sqlx::FromRow)]
struct StockClaim {
    product_id: String,
    quantity: i64,
    ordered_at: Option<DateTime<Utc>>,
}

/// Drops repeated ids, keeping the first position of each.
fn distinct_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

// =============================================================================
// Connection-level helpers (usable inside and outside a transaction)
// =============================================================================

async fn load_order_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT order_item_id FROM order_lines WHERE order_id = ?1 ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let items = load_order_items(conn, &row.id).await?;
            Ok(Some(row.into_order(items)))
        }
        None => Ok(None),
    }
}

async fn fetch_order_by_key(conn: &mut SqliteConnection, key: &str) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE idempotency_key = ?1"
    ))
    .bind(key)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let items = load_order_items(conn, &row.id).await?;
            Ok(Some(row.into_order(items)))
        }
        None => Ok(None),
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order and decrements stock for every referenced order-item,
    /// all or nothing.
    ///
    /// ## Errors
    /// - `DbError::Domain(CoreError::OrderItemNotFound)` for an unknown id
    /// - `DbError::Domain(CoreError::OrderItemAlreadyOrdered)` for a row an
    ///   earlier order already claimed
    /// - `DbError::Domain(CoreError::InsufficientStock)` when a decrement
    ///   would take stock below zero
    ///
    /// Either way no order is stored and no stock changes.
    pub async fn create(&self, new: &NewOrder) -> DbResult<OrderCreation> {
        let mut tx = self.pool.begin().await?;

        if let Some(key) = &new.idempotency_key {
            if let Some(existing) = fetch_order_by_key(&mut tx, key).await? {
                info!(order_id = %existing.id, key = %key, "Replaying order for idempotency key");
                tx.commit().await?;
                return Ok(OrderCreation::Replayed(existing));
            }
        }

        let now = Utc::now();
        let order = Order {
            id: generate_id(),
            customer_id: new.customer_id.clone(),
            order_items: distinct_ids(&new.order_item_ids),
            total_cents: new.total_cents,
            discounted_total_cents: new.discounted_total_cents,
            discount_id: new.discount_id.clone(),
            payment_type: new.payment_type,
            payment_id: None,
            status: new.status,
            is_paid: new.is_paid,
            idempotency_key: new.idempotency_key.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, items = order.order_items.len(), "Inserting order");

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_id, total_cents, discounted_total_cents, discount_id,
                payment_type, payment_id, status, is_paid, idempotency_key,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_id)
        .bind(order.total_cents)
        .bind(order.discounted_total_cents)
        .bind(&order.discount_id)
        .bind(order.payment_type)
        .bind(&order.payment_id)
        .bind(order.status)
        .bind(order.is_paid)
        .bind(&order.idempotency_key)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from);

        if let Err(err) = inserted {
            // A concurrent request with the same key committed first
            if let (true, Some(key)) = (err.is_unique_violation(), &new.idempotency_key) {
                drop(tx);
                let mut conn = self.pool.acquire().await?;
                if let Some(existing) = fetch_order_by_key(&mut conn, key).await? {
                    return Ok(OrderCreation::Replayed(existing));
                }
            }
            return Err(err);
        }

        for (position, item_id) in order.order_items.iter().enumerate() {
            let claim = sqlx::query_as::<_, StockClaim>(
                "SELECT product_id, quantity, ordered_at FROM order_items WHERE id = ?1",
            )
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::OrderItemNotFound(item_id.clone()))?;

            if claim.ordered_at.is_some() {
                debug!(order_item_id = %item_id, "Order item already claimed, rolling back order");
                return Err(CoreError::OrderItemAlreadyOrdered(item_id.clone()).into());
            }

            let claimed = sqlx::query(
                r#"
                UPDATE order_items SET ordered_at = ?2, updated_at = ?2
                WHERE id = ?1 AND ordered_at IS NULL
                "#,
            )
            .bind(item_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if claimed.rows_affected() == 0 {
                return Err(CoreError::OrderItemAlreadyOrdered(item_id.clone()).into());
            }

            sqlx::query(
                "INSERT INTO order_lines (order_id, order_item_id, position) VALUES (?1, ?2, ?3)",
            )
            .bind(&order.id)
            .bind(item_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;

            let decremented = sqlx::query(
                r#"
                UPDATE products SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&claim.product_id)
            .bind(claim.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                warn!(
                    order_id = %order.id,
                    product_id = %claim.product_id,
                    requested = claim.quantity,
                    "Stock decrement refused, rolling back order"
                );
                return Err(CoreError::InsufficientStock {
                    product_id: claim.product_id,
                    requested: claim.quantity,
                }
                .into());
            }
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            total_cents = order.total_cents,
            discounted_total_cents = order.discounted_total_cents,
            status = ?order.status,
            "Order created"
        );

        Ok(OrderCreation::Created(order))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    pub async fn get_by_idempotency_key(&self, key: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order_by_key(&mut conn, key).await
    }

    /// Lists all orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = load_order_items(&mut conn, &row.id).await?;
            orders.push(row.into_order(items));
        }

        Ok(orders)
    }

    /// Populates customer, order-items (with products) and discount.
    pub async fn detail(&self, order: Order) -> DbResult<OrderDetail> {
        let customer = UserRepository::new(self.pool.clone())
            .get_by_id(&order.customer_id)
            .await?
            .map(PublicUser::from);

        let order_item_repo = OrderItemRepository::new(self.pool.clone());
        let mut items = Vec::with_capacity(order.order_items.len());
        for id in &order.order_items {
            if let Some(item) = order_item_repo.get_by_id(id).await? {
                items.push(item);
            }
        }
        let order_items = order_item_repo.populate(items).await?;

        let discount = match &order.discount_id {
            Some(id) => DiscountRepository::new(self.pool.clone()).get_by_id(id).await?,
            None => None,
        };

        Ok(OrderDetail {
            id: order.id,
            customer,
            order_items,
            total_cents: order.total_cents,
            discounted_total_cents: order.discounted_total_cents,
            discount,
            payment_type: order.payment_type,
            payment_id: order.payment_id,
            status: order.status,
            is_paid: order.is_paid,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }

    /// Applies a partial update. No status transition rules are enforced.
    pub async fn update(&self, id: &str, changes: &OrderUpdate) -> DbResult<Order> {
        debug!(id = %id, ?changes, "Updating order");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = COALESCE(?2, status),
                is_paid = COALESCE(?3, is_paid),
                payment_id = COALESCE(?4, payment_id),
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(changes.status)
        .bind(changes.is_paid)
        .bind(&changes.payment_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Deletes an order. Stock is not restored.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(order_id = %id, "Order deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
