//! # Checkout
//!
//! Turns the cart into an order as a saga with compensation.
//!
//! ## Saga
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CheckoutSaga::run                              │
//! │                                                                         │
//! │  1. cart.validate() ───────── Err ──► abort, no server calls            │
//! │  2. GET  /orderItems           (remember existing quantities)           │
//! │  3. POST /orderItems/add ×N    (record Created / Merged step)           │
//! │  4. no ids ─────────────────────────► "Failed to create order items"    │
//! │  5. POST /orders/add           (subtotal, idempotency key)              │
//! │  6. cart.clear()                                                        │
//! │                                                                         │
//! │  Failure after step 3 ──► compensate in reverse:                        │
//! │     Created { id }                  ──► DELETE /orderItems/delete/{id}  │
//! │     Merged  { id, previous_qty }    ──► PUT /orderItems/update/{id}     │
//! │  The cart is left untouched and the original error is returned.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The idempotency key is fixed per saga. Running the same saga again (or a
//! saga built with [`CheckoutSaga::with_key`]) after the server accepted the
//! order returns that order instead of creating a second one.

use std::collections::HashMap;

use stockroom_core::{CreateOrderRequest, Order, PaymentType};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::OrderBackend;
use crate::error::{ClientError, ClientResult};
use crate::store::{CartStorage, CartStore};

/// What the shopper chose at checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub payment_type: PaymentType,
    pub is_paid: bool,
    pub discount_code: Option<String>,
}

/// A server-side write made during checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Created { id: String },
    Merged { id: String, previous_quantity: i64 },
}

/// One checkout attempt and its idempotency key.
#[derive(Debug)]
pub struct CheckoutSaga<B: OrderBackend> {
    backend: B,
    idempotency_key: String,
    steps: Vec<Step>,
}

impl<B: OrderBackend> CheckoutSaga<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, Uuid::new_v4().to_string())
    }

    /// Resumes a checkout under a key that was already sent.
    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        CheckoutSaga {
            backend,
            idempotency_key: key.into(),
            steps: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.idempotency_key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Places the order for everything in the cart.
    pub async fn run<S: CartStorage>(
        &mut self,
        store: &mut CartStore<S>,
        request: CheckoutRequest,
    ) -> ClientResult<Order> {
        store.validate()?;
        self.steps.clear();

        match self.submit(store, request).await {
            Ok(order) => {
                store.clear()?;
                Ok(order)
            }
            Err(e) => {
                warn!(key = %self.idempotency_key, error = %e, "Checkout failed, compensating");
                self.compensate().await;
                Err(e)
            }
        }
    }

    async fn submit<S: CartStorage>(
        &mut self,
        store: &CartStore<S>,
        request: CheckoutRequest,
    ) -> ClientResult<Order> {
        let existing: HashMap<String, (String, i64)> = self
            .backend
            .list_order_items()
            .await?
            .into_iter()
            .map(|detail| (detail.item.product_id, (detail.item.id, detail.item.quantity)))
            .collect();

        let mut ids = Vec::with_capacity(store.cart().lines().len());
        for line in store.cart().lines() {
            let detail = self.backend.add_order_item(&line.product.id, line.quantity).await?;

            let step = match existing.get(&line.product.id) {
                Some((id, quantity)) if *id == detail.item.id => Step::Merged {
                    id: id.clone(),
                    previous_quantity: *quantity,
                },
                _ => Step::Created {
                    id: detail.item.id.clone(),
                },
            };
            self.steps.push(step);
            ids.push(detail.item.id);
        }

        if ids.is_empty() {
            return Err(ClientError::NoOrderItems);
        }

        let placement = self
            .backend
            .create_order(CreateOrderRequest {
                customer: Some(request.customer_id),
                order_items: ids,
                total_cents: Some(store.subtotal().cents()),
                payment_type: Some(request.payment_type),
                is_paid: request.is_paid,
                discount_code: request.discount_code,
                idempotency_key: Some(self.idempotency_key.clone()),
            })
            .await?;

        if placement.replayed {
            // The existing order already owns its items; undo this attempt's writes
            info!(order_id = %placement.order.id, key = %self.idempotency_key, "Order already placed");
            self.compensate().await;
        } else {
            info!(
                order_id = %placement.order.id,
                total = placement.order.discounted_total_cents,
                "Order placed"
            );
        }

        self.steps.clear();
        Ok(placement.order)
    }

    /// Undoes recorded steps, newest first. Failures are logged and skipped.
    async fn compensate(&mut self) {
        while let Some(step) = self.steps.pop() {
            let result = match &step {
                Step::Created { id } => self.backend.delete_order_item(id).await,
                Step::Merged { id, previous_quantity } => self
                    .backend
                    .update_order_item(id, *previous_quantity)
                    .await
                    .map(|_| ()),
            };

            if let Err(e) = result {
                warn!(?step, error = %e, "Compensation step failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OrderPlacement;
    use crate::store::MemoryStorage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use stockroom_core::{CartError, OrderItem, OrderItemDetail, OrderStatus, Product};

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category_id: "cat-1".to_string(),
            image_url: "https://img.example.com/p.jpg".to_string(),
            price_cents,
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct MockState {
        /// (id, product, quantity)
        items: Vec<(String, Product, i64)>,
        orders: HashMap<String, Order>,
        calls: Vec<String>,
        reject_order: Option<String>,
        reject_product: Option<String>,
    }

    #[derive(Default)]
    struct MockBackend {
        state: Mutex<MockState>,
    }

    impl MockBackend {
        fn rejecting_orders(message: &str) -> Self {
            let backend = MockBackend::default();
            backend.state.lock().unwrap().reject_order = Some(message.to_string());
            backend
        }

        fn with_item(self, id: &str, product: Product, quantity: i64) -> Self {
            self.state
                .lock()
                .unwrap()
                .items
                .push((id.to_string(), product, quantity));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        fn quantities(&self) -> Vec<(String, i64)> {
            self.state
                .lock()
                .unwrap()
                .items
                .iter()
                .map(|(id, _, q)| (id.clone(), *q))
                .collect()
        }
    }

    fn detail(id: &str, product: &Product, quantity: i64) -> OrderItemDetail {
        OrderItemDetail {
            item: OrderItem {
                id: id.to_string(),
                owner_id: "user-1".to_string(),
                product_id: product.id.clone(),
                quantity,
                price_cents: product.price_cents * quantity,
                ordered_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            product: product.clone(),
        }
    }

    #[async_trait]
    impl OrderBackend for MockBackend {
        async fn list_order_items(&self) -> ClientResult<Vec<OrderItemDetail>> {
            let mut state = self.state.lock().unwrap();
            state.calls.push("list".to_string());
            Ok(state.items.iter().map(|(id, p, q)| detail(id, p, *q)).collect())
        }

        async fn add_order_item(&self, product_id: &str, quantity: i64) -> ClientResult<OrderItemDetail> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("add {product_id} {quantity}"));
            if state.reject_product.as_deref() == Some(product_id) {
                return Err(ClientError::Api {
                    status: 400,
                    message: "Quantity exceeds stock".to_string(),
                });
            }

            if let Some((id, p, q)) = state.items.iter_mut().find(|(_, p, _)| p.id == product_id) {
                *q += quantity;
                return Ok(detail(id, p, *q));
            }

            let id = format!("item-{}", state.items.len() + 1);
            let p = product(product_id, 2000, 10);
            state.items.push((id.clone(), p.clone(), quantity));
            Ok(detail(&id, &p, quantity))
        }

        async fn update_order_item(&self, id: &str, quantity: i64) -> ClientResult<OrderItemDetail> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("update {id} {quantity}"));
            let (id, p, q) = state
                .items
                .iter_mut()
                .find(|(item_id, _, _)| item_id == id)
                .ok_or_else(|| ClientError::Api {
                    status: 404,
                    message: "Order item not found".to_string(),
                })?;
            *q = quantity;
            Ok(detail(id, p, *q))
        }

        async fn delete_order_item(&self, id: &str) -> ClientResult<()> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("delete {id}"));
            state.items.retain(|(item_id, _, _)| item_id != id);
            Ok(())
        }

        async fn create_order(&self, request: CreateOrderRequest) -> ClientResult<OrderPlacement> {
            let mut state = self.state.lock().unwrap();
            state.calls.push("order".to_string());
            if let Some(message) = &state.reject_order {
                return Err(ClientError::Api {
                    status: 400,
                    message: message.clone(),
                });
            }

            let key = request.idempotency_key.clone().unwrap_or_default();
            if let Some(order) = state.orders.get(&key) {
                return Ok(OrderPlacement {
                    order: order.clone(),
                    replayed: true,
                });
            }

            let total = request.total_cents.unwrap_or_default();
            let order = Order {
                id: format!("order-{}", state.orders.len() + 1),
                customer_id: request.customer.unwrap_or_default(),
                order_items: request.order_items,
                total_cents: total,
                discounted_total_cents: total,
                discount_id: None,
                payment_type: request.payment_type.unwrap_or(PaymentType::Cash),
                payment_id: None,
                status: OrderStatus::initial(request.is_paid),
                is_paid: request.is_paid,
                idempotency_key: request.idempotency_key,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            state.orders.insert(key, order.clone());
            Ok(OrderPlacement { order, replayed: false })
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            customer_id: "user-1".to_string(),
            payment_type: PaymentType::Card,
            is_paid: true,
            discount_code: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_places_order_and_clears_cart() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add(product("p1", 2000, 10), 3).unwrap();

        let mut saga = CheckoutSaga::new(MockBackend::default());
        let order = saga.run(&mut store, request()).await.unwrap();

        assert_eq!(order.total_cents, 6000);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.order_items, vec!["item-1".to_string()]);
        assert_eq!(order.idempotency_key.as_deref(), Some(saga.key()));
        assert!(store.cart().is_empty());
        assert_eq!(saga.backend().calls(), vec!["list", "add p1 3", "order"]);
    }

    #[tokio::test]
    async fn test_invalid_cart_makes_no_calls() {
        let mut store = CartStore::open(MemoryStorage::new());

        let mut saga = CheckoutSaga::new(MockBackend::default());
        let err = saga.run(&mut store, request()).await.unwrap_err();

        assert!(matches!(err, ClientError::Cart(CartError::Empty)));
        assert_eq!(err.to_string(), "Your cart is empty");
        assert!(saga.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_order_compensates_and_keeps_cart() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add(product("p1", 2000, 10), 3).unwrap();
        store.add(product("p2", 2000, 10), 1).unwrap();
        let before = store.cart().clone();

        let backend = MockBackend::rejecting_orders("Invalid or expired discount code")
            .with_item("item-old", product("p2", 2000, 10), 2);
        let mut saga = CheckoutSaga::new(backend);

        let mut checkout = request();
        checkout.discount_code = Some("OLD".to_string());
        let err = saga.run(&mut store, checkout).await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid or expired discount code");
        assert_eq!(store.cart(), &before);
        // p1's new row is gone, p2's merged row is back to 2
        assert_eq!(saga.backend().quantities(), vec![("item-old".to_string(), 2)]);
        assert_eq!(
            saga.backend().calls(),
            vec!["list", "add p1 3", "add p2 1", "order", "update item-old 2", "delete item-2"]
        );
    }

    #[tokio::test]
    async fn test_failed_upsert_undoes_earlier_lines() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add(product("p1", 2000, 10), 1).unwrap();
        store.add(product("p2", 2000, 10), 1).unwrap();

        let backend = MockBackend::default();
        backend.state.lock().unwrap().reject_product = Some("p2".to_string());
        let mut saga = CheckoutSaga::new(backend);

        let err = saga.run(&mut store, request()).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(saga.backend().quantities().is_empty());
        assert!(!saga.backend().calls().contains(&"order".to_string()));
        assert_eq!(store.cart().lines().len(), 2);
    }

    #[tokio::test]
    async fn test_same_key_returns_first_order() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add(product("p1", 2000, 10), 3).unwrap();

        let mut saga = CheckoutSaga::with_key(MockBackend::default(), "fixed-key");
        let first = saga.run(&mut store, request()).await.unwrap();

        store.add(product("p1", 2000, 10), 3).unwrap();
        let second = saga.run(&mut store, request()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(store.cart().is_empty());
        // The replayed attempt's merge was rolled back
        assert_eq!(saga.backend().quantities(), vec![("item-1".to_string(), 3)]);
        assert_eq!(saga.backend().state.lock().unwrap().orders.len(), 1);
    }
}
