//! # Order Service
//!
//! Validates an order request, prices it, and hands it to the order
//! repository, which writes the order and decrements stock in one
//! transaction.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /orders/add                                                       │
//! │      │                                                                  │
//! │      ├── customer / paymentType / totalCents / orderItems missing       │
//! │      │        └──► 400 "Please provide all required fields"            │
//! │      ├── orderItems id not a UUID ──► 400 "Invalid orderItem ID: <id>" │
//! │      ├── idempotency key already used ──► 200 + earlier order          │
//! │      ├── discount code ──► discount_service::totals_for                │
//! │      ├── status = CONFIRMED if paid else PENDING                       │
//! │      │                                                                  │
//! │      └── OrderRepository::create (one transaction)                     │
//! │              ├── unknown order-item ──► 404, rolled back               │
//! │              ├── stock too low ───────► 400 "Insufficient stock"       │
//! │              └── COMMIT ──► 201 + order                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use stockroom_core::validation::{validate_reference_ids, validate_total_cents};
use stockroom_core::{
    CoreError, CreateOrderRequest, Money, Order, OrderDetail, OrderStatus, UpdateOrderRequest,
    UpdatePaymentRequest, ValidationError,
};
use stockroom_db::{Database, NewOrder, OrderCreation, OrderUpdate};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::discount_service;

/// Body of `PUT /orders/update-status/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Creates an order, or returns the earlier order for a reused idempotency
/// key.
pub async fn create(db: &Database, request: CreateOrderRequest) -> ApiResult<OrderCreation> {
    let CreateOrderRequest {
        customer,
        order_items,
        total_cents,
        payment_type,
        is_paid,
        discount_code,
        idempotency_key,
    } = request;

    let (customer_id, total_cents, payment_type) = match (customer, total_cents, payment_type) {
        (Some(c), Some(t), Some(p)) if !c.trim().is_empty() && !order_items.is_empty() => (c, t, p),
        _ => return Err(ValidationError::MissingFields.into()),
    };
    validate_reference_ids("orderItem", &order_items)?;
    validate_total_cents(total_cents)?;

    let idempotency_key = idempotency_key.filter(|k| !k.trim().is_empty());
    if let Some(key) = &idempotency_key {
        if let Some(existing) = db.orders().get_by_idempotency_key(key).await? {
            info!(order_id = %existing.id, "Order request replayed");
            return Ok(OrderCreation::Replayed(existing));
        }
    }

    if db.users().get_by_id(&customer_id).await?.is_none() {
        return Err(ApiError::not_found("User", &customer_id));
    }

    let code = discount_code.as_deref().filter(|c| !c.trim().is_empty());
    let (discount, totals) =
        discount_service::totals_for(db, Money::from_cents(total_cents), code).await?;

    let new_order = NewOrder {
        customer_id,
        order_item_ids: order_items,
        total_cents: totals.total.cents(),
        discounted_total_cents: totals.discounted_total.cents(),
        discount_id: discount.map(|d| d.id),
        payment_type,
        status: OrderStatus::initial(is_paid),
        is_paid,
        idempotency_key,
    };

    Ok(db.orders().create(&new_order).await?)
}

/// Every order, newest first, with customer, items and discount populated.
pub async fn list(db: &Database) -> ApiResult<Vec<OrderDetail>> {
    let orders = db.orders().list().await?;

    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(db.orders().detail(order).await?);
    }
    Ok(details)
}

/// One order, populated.
pub async fn get(db: &Database, id: &str) -> ApiResult<OrderDetail> {
    let order = find(db, id).await?;
    Ok(db.orders().detail(order).await?)
}

/// Applies any subset of status, payment flag and payment id.
pub async fn update(db: &Database, id: &str, request: UpdateOrderRequest) -> ApiResult<Order> {
    let changes = OrderUpdate {
        status: request.status,
        is_paid: request.is_paid,
        payment_id: request.payment_id,
    };
    apply(db, id, changes).await
}

pub async fn update_status(
    db: &Database,
    id: &str,
    request: UpdateStatusRequest,
) -> ApiResult<Order> {
    let status = request.status.ok_or_else(|| ValidationError::Required {
        field: "status".to_string(),
    })?;

    apply(
        db,
        id,
        OrderUpdate {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

pub async fn update_payment(
    db: &Database,
    id: &str,
    request: UpdatePaymentRequest,
) -> ApiResult<Order> {
    apply(
        db,
        id,
        OrderUpdate {
            is_paid: Some(request.is_paid),
            payment_id: request.payment_id,
            ..Default::default()
        },
    )
    .await
}

/// Deletes an order. Stock taken by the order is not returned.
pub async fn delete(db: &Database, id: &str) -> ApiResult<Order> {
    let order = find(db, id).await?;
    db.orders().delete(&order.id).await?;
    Ok(order)
}

async fn find(db: &Database, id: &str) -> ApiResult<Order> {
    db.orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
}

async fn apply(db: &Database, id: &str, changes: OrderUpdate) -> ApiResult<Order> {
    let order = find(db, id).await?;
    let updated = db.orders().update(&order.id, &changes).await?;
    info!(order_id = %updated.id, status = ?updated.status, is_paid = updated.is_paid, "Order updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::test_support;
    use crate::services::order_item_service;
    use chrono::Duration;
    use stockroom_core::{AddOrderItemRequest, PaymentType};

    struct Fixture {
        db: Database,
        customer: String,
        product: String,
        item: String,
    }

    /// Stock 10, price 20.00, one order-item of 3.
    async fn fixture() -> Fixture {
        let db = test_support::db().await;
        let ada = test_support::user(&db, "ada").await;
        let widget = test_support::product(&db, "Widget", 2000, 10).await;
        let item = order_item_service::add(
            &db,
            &ada.id,
            AddOrderItemRequest {
                product: widget.id.clone(),
                quantity: Some(3),
            },
        )
        .await
        .unwrap();

        Fixture {
            db,
            customer: ada.id,
            product: widget.id,
            item: item.item.id,
        }
    }

    fn request(f: &Fixture) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: Some(f.customer.clone()),
            order_items: vec![f.item.clone()],
            total_cents: Some(6000),
            payment_type: Some(PaymentType::Card),
            is_paid: true,
            ..Default::default()
        }
    }

    async fn stock(f: &Fixture) -> i64 {
        f.db.products().get_by_id(&f.product).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_paid_order_without_code() {
        let f = fixture().await;

        let created = create(&f.db, request(&f)).await.unwrap();
        assert!(!created.is_replay());

        let order = created.order();
        assert_eq!(order.total_cents, 6000);
        assert_eq!(order.discounted_total_cents, 6000);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.discount_id.is_none());
        assert_eq!(stock(&f).await, 7);
    }

    #[tokio::test]
    async fn test_unpaid_order_with_code() {
        let f = fixture().await;
        test_support::discount(&f.db, "SAVE10", 10, true, Duration::days(7)).await;

        let mut req = request(&f);
        req.is_paid = false;
        req.discount_code = Some(" save10".to_string());

        let order = create(&f.db, req).await.unwrap().into_order();
        assert_eq!(order.discounted_total_cents, 5400);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.discount_id.is_some());
    }

    #[tokio::test]
    async fn test_expired_code_creates_nothing() {
        let f = fixture().await;
        test_support::discount(&f.db, "OLD", 10, true, Duration::days(-1)).await;

        let mut req = request(&f);
        req.discount_code = Some("OLD".to_string());

        let err = create(&f.db, req).await.unwrap_err();
        assert_eq!(err.message, "Invalid or expired discount code");
        assert!(f.db.orders().list().await.unwrap().is_empty());
        assert_eq!(stock(&f).await, 10);
    }

    #[tokio::test]
    async fn test_required_fields_and_ids() {
        let f = fixture().await;

        let mut req = request(&f);
        req.order_items.clear();
        let err = create(&f.db, req).await.unwrap_err();
        assert_eq!(err.message, "Please provide all required fields");

        let mut req = request(&f);
        req.payment_type = None;
        assert!(create(&f.db, req).await.is_err());

        let mut req = request(&f);
        req.order_items.push("abc".to_string());
        let err = create(&f.db, req).await.unwrap_err();
        assert_eq!(err.message, "Invalid orderItem ID: abc");
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let f = fixture().await;

        let mut req = request(&f);
        req.order_items.push(uuid::Uuid::new_v4().to_string());
        let err = create(&f.db, req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(stock(&f).await, 10);
    }

    #[tokio::test]
    async fn test_idempotent_create() {
        let f = fixture().await;

        let mut req = request(&f);
        req.idempotency_key = Some(uuid::Uuid::new_v4().to_string());

        let first = create(&f.db, req.clone()).await.unwrap();
        let second = create(&f.db, req).await.unwrap();

        assert!(second.is_replay());
        assert_eq!(first.order().id, second.order().id);
        assert_eq!(stock(&f).await, 7);
    }

    #[tokio::test]
    async fn test_status_and_payment_updates() {
        let f = fixture().await;
        let mut req = request(&f);
        req.is_paid = false;
        let order = create(&f.db, req).await.unwrap().into_order();

        let paid = update_payment(
            &f.db,
            &order.id,
            UpdatePaymentRequest {
                is_paid: true,
                payment_id: Some("pay_123".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(paid.is_paid);
        assert_eq!(paid.payment_id.as_deref(), Some("pay_123"));

        let cancelled = update_status(
            &f.db,
            &order.id,
            UpdateStatusRequest {
                status: Some(OrderStatus::Cancelled),
            },
        )
        .await
        .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.is_paid);

        let err = update_status(&f.db, &order.id, UpdateStatusRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let missing = uuid::Uuid::new_v4().to_string();
        let err = update(&f.db, &missing, UpdateOrderRequest::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_get_list_and_delete() {
        let f = fixture().await;
        let order = create(&f.db, request(&f)).await.unwrap().into_order();

        let detail = get(&f.db, &order.id).await.unwrap();
        assert_eq!(detail.order_items.len(), 1);
        assert_eq!(detail.order_items[0].product.name, "Widget");
        assert_eq!(detail.customer.as_ref().map(|c| c.username.as_str()), Some("ada"));

        assert_eq!(list(&f.db).await.unwrap().len(), 1);

        delete(&f.db, &order.id).await.unwrap();
        assert!(list(&f.db).await.unwrap().is_empty());
        // Stock stays decremented
        assert_eq!(stock(&f).await, 7);
    }

    #[tokio::test]
    async fn test_repeated_item_is_ordered_once() {
        let f = fixture().await;

        let mut req = request(&f);
        req.order_items = vec![f.item.clone(), f.item.clone()];

        let order = create(&f.db, req).await.unwrap().into_order();
        assert_eq!(order.order_items, vec![f.item.clone()]);
        assert_eq!(stock(&f).await, 7);
    }

    #[tokio::test]
    async fn test_item_cannot_be_ordered_twice() {
        let f = fixture().await;
        create(&f.db, request(&f)).await.unwrap();

        let err = create(&f.db, request(&f)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Order item is part of an order");
        assert_eq!(list(&f.db).await.unwrap().len(), 1);
        assert_eq!(stock(&f).await, 7);
    }
}
