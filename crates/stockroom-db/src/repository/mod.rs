//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service / Handler                                                     │
//! │       │                                                                 │
//! │       │  db.order_items().find_for_owner(user, product)                │
//! │       ▼                                                                 │
//! │  OrderItemRepository                                                   │
//! │  ├── find_for_owner(&self, owner, product)                             │
//! │  ├── insert(&self, owner, product, qty, price)                         │
//! │  └── set_quantity(&self, id, qty, price)                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories hold no business rules beyond what a single statement or
//! transaction enforces. Stock ceilings and discount validity are decided in
//! the services using stockroom-core.
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts for the authenticated customer identity
//! - [`CategoryRepository`] - Category CRUD
//! - [`ProductRepository`] - Product CRUD (the stock ledger)
//! - [`DiscountRepository`] - Discount codes
//! - [`OrderItemRepository`] - Per-(owner, product) order lines
//! - [`OrderRepository`] - Orders, including the create + decrement transaction

pub mod category;
pub mod discount;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

pub use category::CategoryRepository;
pub use discount::{DiscountRepository, DiscountUpdate, NewDiscount};
pub use order::{NewOrder, OrderCreation, OrderRepository, OrderUpdate};
pub use order_item::OrderItemRepository;
pub use product::{NewProduct, ProductRepository, ProductUpdate};
pub use user::UserRepository;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use stockroom_core::{Category, Product, User};

    use super::NewProduct;
    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn user(db: &Database, name: &str) -> User {
        db.users()
            .insert(name, &format!("{name}@example.com"), "hash")
            .await
            .unwrap()
    }

    pub async fn category(db: &Database, name: &str) -> Category {
        db.categories().insert(name).await.unwrap()
    }

    pub async fn product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        let category = match db.categories().get_by_name("General").await.unwrap() {
            Some(c) => c,
            None => category(db, "General").await,
        };
        db.products()
            .insert(&NewProduct {
                name: name.to_string(),
                category_id: category.id,
                image_url: "https://img.example.com/p.png".to_string(),
                price_cents,
                stock,
            })
            .await
            .unwrap()
    }
}
