//! # Order-Item Repository
//!
//! One open row per (owner, product). The upsert decision (create vs. merge)
//! is made by the order-item service; this repository only offers the
//! individual reads and writes.
//!
//! Placing an order stamps `ordered_at` on every row it references. Stamped
//! rows are frozen: the finders skip them, writes refuse them, and the next
//! add for the same product opens a fresh row.
//!
//! ```text
//! find_for_owner(owner, product)
//!      │
//!      ├── None ──────► insert(owner, product, qty, price)
//!      │
//!      └── Some(row) ─► set_quantity(row.id, row.qty + qty, price)
//! ```
//!
//! The read-then-write pair is not atomic; two concurrent upserts for the
//! same pair can both pass the stock check. The partial unique index on open
//! rows turns a racing double insert into a `UniqueViolation`.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::{CoreError, OrderItem, OrderItemDetail};
use tracing::debug;

use super::generate_id;
use super::product::ProductRepository;
use crate::error::{DbError, DbResult};

const ORDER_ITEM_COLUMNS: &str =
    "id, owner_id, product_id, quantity, price_cents, ordered_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct OrderItemRepository {
    pool: SqlitePool,
}

impl OrderItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderItemRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<OrderItem>> {
        let item = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Finds the caller's open row for a product, if any.
    pub async fn find_for_owner(
        &self,
        owner_id: &str,
        product_id: &str,
    ) -> DbResult<Option<OrderItem>> {
        let item = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items \
             WHERE owner_id = ?1 AND product_id = ?2 AND ordered_at IS NULL"
        ))
        .bind(owner_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Inserts a new row.
    pub async fn insert(
        &self,
        owner_id: &str,
        product_id: &str,
        quantity: i64,
        price_cents: i64,
    ) -> DbResult<OrderItem> {
        let now = Utc::now();
        let item = OrderItem {
            id: generate_id(),
            owner_id: owner_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            price_cents,
            ordered_at: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, product_id = %product_id, quantity, "Inserting order item");

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, owner_id, product_id, quantity, price_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.owner_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.price_cents)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(product_id))?;

        Ok(item)
    }

    /// Sets quantity and price on an open row and returns it.
    pub async fn set_quantity(&self, id: &str, quantity: i64, price_cents: i64) -> DbResult<OrderItem> {
        debug!(id = %id, quantity, "Updating order item quantity");

        let result = sqlx::query(
            r#"
            UPDATE order_items SET quantity = ?2, price_cents = ?3, updated_at = ?4
            WHERE id = ?1 AND ordered_at IS NULL
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_ordered(id).await);
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order item", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order item");

        let result = sqlx::query("DELETE FROM order_items WHERE id = ?1 AND ordered_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_ordered(id).await);
        }

        Ok(())
    }

    /// Error for a write that matched no open row.
    async fn missing_or_ordered(&self, id: &str) -> DbError {
        match self.get_by_id(id).await {
            Ok(Some(item)) if item.is_ordered() => {
                CoreError::OrderItemAlreadyOrdered(id.to_string()).into()
            }
            Ok(_) => DbError::not_found("Order item", id),
            Err(e) => e,
        }
    }

    /// Lists the caller's open rows with their products, newest first.
    pub async fn list_for_owner(&self, owner_id: &str) -> DbResult<Vec<OrderItemDetail>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            SELECT {ORDER_ITEM_COLUMNS} FROM order_items
            WHERE owner_id = ?1 AND ordered_at IS NULL
            ORDER BY created_at DESC, rowid DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        self.populate(items).await
    }

    /// Attaches each row's product. Rows whose product has vanished are
    /// dropped.
    pub async fn populate(&self, items: Vec<OrderItem>) -> DbResult<Vec<OrderItemDetail>> {
        let products = ProductRepository::new(self.pool.clone());
        let mut details = Vec::with_capacity(items.len());

        for item in items {
            if let Some(product) = products.get_by_id(&item.product_id).await? {
                details.push(OrderItemDetail { item, product });
            }
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stockroom_core::CoreError;

    use crate::repository::test_support;
    use crate::DbError;

    #[tokio::test]
    async fn test_insert_find_and_update() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "ada").await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;
        let repo = db.order_items();

        assert!(repo.find_for_owner(&user.id, &widget.id).await.unwrap().is_none());

        let item = repo.insert(&user.id, &widget.id, 3, 6000).await.unwrap();
        let found = repo.find_for_owner(&user.id, &widget.id).await.unwrap().unwrap();
        assert_eq!(found.id, item.id);

        let updated = repo.set_quantity(&item.id, 5, 10000).await.unwrap();
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.price_cents, 10000);
    }

    #[tokio::test]
    async fn test_one_row_per_owner_and_product() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "ada").await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;

        db.order_items().insert(&user.id, &widget.id, 1, 2000).await.unwrap();
        let err = db
            .order_items()
            .insert(&user.id, &widget.id, 1, 2000)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_list_for_owner_populates_products() {
        let db = test_support::db().await;
        let ada = test_support::user(&db, "ada").await;
        let bob = test_support::user(&db, "bob").await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;

        db.order_items().insert(&ada.id, &widget.id, 2, 4000).await.unwrap();
        db.order_items().insert(&bob.id, &widget.id, 1, 2000).await.unwrap();

        let listed = db.order_items().list_for_owner(&ada.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product.name, "Widget");
        assert_eq!(listed[0].item.quantity, 2);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let db = test_support::db().await;
        let err = db.order_items().delete("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_ordered_row_is_frozen_and_a_new_row_opens() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "ada").await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;
        let repo = db.order_items();

        let ordered = repo.insert(&user.id, &widget.id, 3, 6000).await.unwrap();
        sqlx::query("UPDATE order_items SET ordered_at = ?2 WHERE id = ?1")
            .bind(&ordered.id)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        assert!(repo.find_for_owner(&user.id, &widget.id).await.unwrap().is_none());
        assert!(repo.list_for_owner(&user.id).await.unwrap().is_empty());

        let err = repo.set_quantity(&ordered.id, 5, 10000).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OrderItemAlreadyOrdered(_))
        ));
        let err = repo.delete(&ordered.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OrderItemAlreadyOrdered(_))
        ));

        let open = repo.insert(&user.id, &widget.id, 2, 4000).await.unwrap();
        assert_ne!(open.id, ordered.id);
        let found = repo.find_for_owner(&user.id, &widget.id).await.unwrap().unwrap();
        assert_eq!(found.id, open.id);

        let kept = repo.get_by_id(&ordered.id).await.unwrap().unwrap();
        assert!(kept.is_ordered());
        assert_eq!(kept.quantity, 3);
    }
}
