//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes products.stock                            │
//! │                                                                         │
//! │  POST /products/create-product ──► insert()        initial stock       │
//! │  PUT  /products/update-product ──► update()        manual correction   │
//! │  POST /orders/add ───────────────► OrderRepository::create()           │
//! │                                    UPDATE ... SET stock = stock - ?    │
//! │                                    WHERE stock >= ?  (one tx)          │
//! │                                                                         │
//! │  Order-item upserts only READ stock.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::{Product, ProductListing};
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.category_id, p.image_url, p.price_cents, p.stock, p.created_at, p.updated_at";

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category_id: String,
    pub image_url: String,
    pub price_cents: i64,
    pub stock: i64,
}

/// Partial product update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product with its category name, newest first.
    pub async fn list(&self) -> DbResult<Vec<ProductListing>> {
        let products = sqlx::query_as::<_, ProductListing>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, c.name AS category_name
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.created_at DESC, p.rowid DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists the products of one category.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<ProductListing>> {
        let products = sqlx::query_as::<_, ProductListing>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, c.name AS category_name
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.category_id = ?1
            ORDER BY p.name
            "#
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// - `UniqueViolation` on a duplicate name
    /// - `ForeignKeyViolation` on an unknown category
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: new.name.clone(),
            category_id: new.category_id.clone(),
            image_url: new.image_url.clone(),
            price_cents: new.price_cents,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, stock = product.stock, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category_id, image_url,
                price_cents, stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(&product.image_url)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&new.name))?;

        Ok(product)
    }

    /// Applies a partial update and returns the stored product.
    pub async fn update(&self, id: &str, changes: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                category_id = COALESCE(?3, category_id),
                image_url = COALESCE(?4, image_url),
                price_cents = COALESCE(?5, price_cents),
                stock = COALESCE(?6, stock),
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.category_id)
        .bind(&changes.image_url)
        .bind(changes.price_cents)
        .bind(changes.stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from(e).with_duplicate_value(changes.name.clone().unwrap_or_default())
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Order-items referencing it are removed with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    #[tokio::test]
    async fn test_insert_and_list_with_category_name() {
        let db = test_support::db().await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;

        let listed = db.products().list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product, widget);
        assert_eq!(listed[0].category_name.as_deref(), Some("General"));

        let by_category = db
            .products()
            .list_by_category(&widget.category_id)
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_and_unknown_category() {
        let db = test_support::db().await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;

        let mut new = NewProduct {
            name: "Widget".to_string(),
            category_id: widget.category_id.clone(),
            image_url: widget.image_url.clone(),
            price_cents: 1,
            stock: 1,
        };
        let err = db.products().insert(&new).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "Widget"));

        new.name = "Gadget".to_string();
        new.category_id = generate_id();
        let err = db.products().insert(&new).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = test_support::db().await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;

        let updated = db
            .products()
            .update(
                &widget.id,
                &ProductUpdate {
                    stock: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stock, 4);
        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.price_cents, 2000);
    }

    #[tokio::test]
    async fn test_negative_stock_is_refused_by_schema() {
        let db = test_support::db().await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;

        let err = db
            .products()
            .update(
                &widget.id,
                &ProductUpdate {
                    stock: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let db = test_support::db().await;
        let err = db.products().delete(&generate_id()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
