//! # Category Repository

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::Category;
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};

/// Repository for product categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a category. Duplicate names are a `UniqueViolation`.
    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: generate_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            "INSERT INTO categories (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(name))?;

        Ok(category)
    }

    /// Renames a category.
    pub async fn update(&self, id: &str, name: &str) -> DbResult<Category> {
        let result = sqlx::query("UPDATE categories SET name = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category. Fails with a foreign key violation while products
    /// still reference it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support;
    use crate::DbError;

    #[tokio::test]
    async fn test_category_crud() {
        let db = test_support::db().await;
        let repo = db.categories();

        let tools = repo.insert("Tools").await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);

        let renamed = repo.update(&tools.id, "Hand Tools").await.unwrap();
        assert_eq!(renamed.name, "Hand Tools");

        repo.delete(&tools.id).await.unwrap();
        assert!(repo.get_by_id(&tools.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&tools.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_category_name() {
        let db = test_support::db().await;
        db.categories().insert("Tools").await.unwrap();

        let err = db.categories().insert("Tools").await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_category_in_use_cannot_be_deleted() {
        let db = test_support::db().await;
        test_support::product(&db, "Widget", 100, 1).await;
        let general = db.categories().get_by_name("General").await.unwrap().unwrap();

        let err = db.categories().delete(&general.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
