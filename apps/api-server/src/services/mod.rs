//! # Services
//!
//! Business operations behind the HTTP routes. Handlers parse and
//! authenticate; services validate, consult the database and decide.
//!
//! ```text
//! routes/order_items.rs ──► order_item_service   (upsert with stock ceiling)
//! routes/discounts.rs ────► discount_service     (lookup + totals)
//! routes/orders.rs ───────► order_service        (create, decrement stock)
//!                               └──► discount_service
//! routes/users.rs ────────► user_service         (register, login)
//! ```

pub mod discount_service;
pub mod order_item_service;
pub mod order_service;
pub mod user_service;

#[cfg(test)]
pub(crate) mod test_support {
    use stockroom_core::{Discount, Product, User};
    use stockroom_db::{Database, DbConfig, NewDiscount, NewProduct};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn user(db: &Database, name: &str) -> User {
        db.users()
            .insert(name, &format!("{name}@example.com"), "not-a-real-hash")
            .await
            .unwrap()
    }

    pub async fn product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        let category = match db.categories().get_by_name("General").await.unwrap() {
            Some(c) => c,
            None => db.categories().insert("General").await.unwrap(),
        };

        db.products()
            .insert(&NewProduct {
                name: name.to_string(),
                category_id: category.id,
                image_url: format!("https://img.example.com/{name}.jpg"),
                price_cents,
                stock,
            })
            .await
            .unwrap()
    }

    pub async fn discount(
        db: &Database,
        code: &str,
        percentage: i64,
        is_active: bool,
        expires_in: chrono::Duration,
    ) -> Discount {
        db.discounts()
            .insert(&NewDiscount {
                code: code.to_string(),
                percentage,
                is_active,
                expires_at: chrono::Utc::now() + expires_in,
            })
            .await
            .unwrap()
    }
}
