//! # Order-Item Service
//!
//! Upserts one open line per (customer, product) and keeps its quantity under
//! the product's current stock. Stock itself is not touched here; it is only
//! decremented when an order is created. Lines an order has claimed are
//! read-only: update and delete answer 400.
//!
//! ## Upsert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add(owner, { product, quantity = 1 })                                  │
//! │      │                                                                  │
//! │      ├── quantity out of range / malformed id ─────► 400               │
//! │      ├── product missing ──────────────────────────► 404               │
//! │      ├── quantity > stock ─────────────────────────► 400               │
//! │      │                                                                  │
//! │      ├── no open row for (owner, product)                              │
//! │      │       └── insert(qty, price = unit × qty)                       │
//! │      │                                                                  │
//! │      └── open row exists                                               │
//! │              ├── existing + qty > stock ───────────► 400               │
//! │              └── set_quantity(existing + qty, unit × total)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_core::validation::{validate_quantity, validate_reference_ids};
use stockroom_core::{
    AddOrderItemRequest, CoreError, Money, OrderItem, OrderItemDetail, Product, ValidationError,
    DEFAULT_ORDER_ITEM_QUANTITY,
};
use stockroom_db::Database;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};

fn exceeds_stock(product: &Product, requested: i64) -> CoreError {
    CoreError::QuantityExceedsStock {
        product: product.name.clone(),
        available: product.stock,
        requested,
    }
}

/// Unit price × quantity, refused when it does not fit in cents.
fn line_price(product: &Product, quantity: i64) -> ApiResult<Money> {
    product
        .price()
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| {
            ValidationError::TooLarge {
                field: "price".to_string(),
            }
            .into()
        })
}

async fn load_product(db: &Database, product_id: &str) -> ApiResult<Product> {
    db.products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

async fn merge(
    db: &Database,
    existing: &OrderItem,
    product: &Product,
    quantity: i64,
) -> ApiResult<OrderItem> {
    let merged = existing
        .quantity
        .checked_add(quantity)
        .filter(|merged| product.has_stock_for(*merged))
        .ok_or_else(|| exceeds_stock(product, existing.quantity.saturating_add(quantity)))?;

    debug!(id = %existing.id, from = existing.quantity, to = merged, "Merging order item");
    let price = line_price(product, merged)?;
    Ok(db
        .order_items()
        .set_quantity(&existing.id, merged, price.cents())
        .await?)
}

/// Creates or merges the caller's order-item for a product.
pub async fn add(
    db: &Database,
    owner_id: &str,
    request: AddOrderItemRequest,
) -> ApiResult<OrderItemDetail> {
    let quantity = request.quantity.unwrap_or(DEFAULT_ORDER_ITEM_QUANTITY);
    validate_quantity(quantity)?;
    validate_reference_ids("product", std::slice::from_ref(&request.product))?;

    let product = load_product(db, &request.product).await?;
    if !product.has_stock_for(quantity) {
        return Err(exceeds_stock(&product, quantity).into());
    }

    let item = match db.order_items().find_for_owner(owner_id, &product.id).await? {
        Some(existing) => merge(db, &existing, &product, quantity).await?,
        None => {
            let price = line_price(&product, quantity)?;
            match db
                .order_items()
                .insert(owner_id, &product.id, quantity, price.cents())
                .await
            {
                Ok(item) => item,
                // A concurrent add for the same pair inserted first
                Err(e) if e.is_unique_violation() => {
                    let existing = db
                        .order_items()
                        .find_for_owner(owner_id, &product.id)
                        .await?
                        .ok_or_else(|| ApiError::from(e))?;
                    merge(db, &existing, &product, quantity).await?
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    info!(
        id = %item.id,
        product_id = %product.id,
        quantity = item.quantity,
        "Order item saved"
    );

    Ok(OrderItemDetail { item, product })
}

/// Sets the quantity of one of the caller's order-items.
pub async fn update_quantity(
    db: &Database,
    owner_id: &str,
    id: &str,
    quantity: i64,
) -> ApiResult<OrderItemDetail> {
    validate_quantity(quantity)?;

    let existing = open_item(db, owner_id, id).await?;
    let product = load_product(db, &existing.product_id).await?;
    if !product.has_stock_for(quantity) {
        return Err(exceeds_stock(&product, quantity).into());
    }

    let price = line_price(&product, quantity)?;
    let item = db
        .order_items()
        .set_quantity(&existing.id, quantity, price.cents())
        .await?;

    Ok(OrderItemDetail { item, product })
}

/// Deletes one of the caller's order-items.
pub async fn delete(db: &Database, owner_id: &str, id: &str) -> ApiResult<()> {
    let existing = open_item(db, owner_id, id).await?;
    db.order_items().delete(&existing.id).await?;
    info!(id = %id, "Order item deleted");
    Ok(())
}

/// The caller's open order-items with their products.
pub async fn list(db: &Database, owner_id: &str) -> ApiResult<Vec<OrderItemDetail>> {
    Ok(db.order_items().list_for_owner(owner_id).await?)
}

/// Rows belonging to someone else are reported as missing.
async fn open_item(db: &Database, owner_id: &str, id: &str) -> ApiResult<OrderItem> {
    match db.order_items().get_by_id(id).await? {
        Some(item) if item.owner_id != owner_id => {
            Err(CoreError::OrderItemNotFound(id.to_string()).into())
        }
        Some(item) if item.is_ordered() => {
            Err(CoreError::OrderItemAlreadyOrdered(id.to_string()).into())
        }
        Some(item) => Ok(item),
        None => Err(CoreError::OrderItemNotFound(id.to_string()).into()),
    }
}
