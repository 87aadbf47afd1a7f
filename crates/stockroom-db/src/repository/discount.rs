//! # Discount Repository
//!
//! Codes are stored uppercased; callers normalize before lookup. Whether a
//! code is usable right now (active, not expired) is decided by
//! `stockroom_core::discount::resolve`, not by SQL, so the comparison happens
//! on typed timestamps.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use stockroom_core::Discount;
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};

const DISCOUNT_COLUMNS: &str =
    "id, code, percentage, is_active, expires_at, created_at, updated_at";

/// Fields for a new discount code.
#[derive(Debug, Clone)]
pub struct NewDiscount {
    /// Already normalized (uppercase).
    pub code: String,
    pub percentage: i64,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
}

/// Partial discount update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct DiscountUpdate {
    pub code: Option<String>,
    pub percentage: Option<i64>,
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let discounts = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(discounts)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Looks up a code exactly as given (callers pass it uppercased).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        debug!(code = %code, "Looking up discount code");

        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    pub async fn insert(&self, new: &NewDiscount) -> DbResult<Discount> {
        let now = Utc::now();
        let discount = Discount {
            id: generate_id(),
            code: new.code.clone(),
            percentage: new.percentage,
            is_active: new.is_active,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %discount.id, code = %discount.code, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, code, percentage, is_active, expires_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.code)
        .bind(discount.percentage)
        .bind(discount.is_active)
        .bind(discount.expires_at)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&new.code))?;

        Ok(discount)
    }

    pub async fn update(&self, id: &str, changes: &DiscountUpdate) -> DbResult<Discount> {
        debug!(id = %id, "Updating discount");

        let result = sqlx::query(
            r#"
            UPDATE discounts SET
                code = COALESCE(?2, code),
                percentage = COALESCE(?3, percentage),
                is_active = COALESCE(?4, is_active),
                expires_at = COALESCE(?5, expires_at),
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&changes.code)
        .bind(changes.percentage)
        .bind(changes.is_active)
        .bind(changes.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from(e).with_duplicate_value(changes.code.clone().unwrap_or_default())
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use chrono::Duration;

    fn save10() -> NewDiscount {
        NewDiscount {
            code: "SAVE10".to_string(),
            percentage: 10,
            is_active: true,
            expires_at: Utc::now() + Duration::days(30),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_code() {
        let db = test_support::db().await;
        let created = db.discounts().insert(&save10()).await.unwrap();

        let found = db.discounts().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(found.is_active);
        assert!(db.discounts().get_by_code("save10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code() {
        let db = test_support::db().await;
        db.discounts().insert(&save10()).await.unwrap();
        let err = db.discounts().insert(&save10()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "SAVE10"));
    }

    #[tokio::test]
    async fn test_deactivate() {
        let db = test_support::db().await;
        let created = db.discounts().insert(&save10()).await.unwrap();

        let updated = db
            .discounts()
            .update(
                &created.id,
                &DiscountUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.percentage, 10);
    }
}
