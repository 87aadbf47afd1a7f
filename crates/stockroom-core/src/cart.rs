//! # Cart
//!
//! The shopper's pending lines before checkout.
//!
//! The cart is a plain value. Every change goes through [`Cart::apply`], a
//! pure transition that either returns the next cart or rejects the action
//! and leaves the current value untouched. Persistence is layered on top by
//! the client's `CartStore`.
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Transitions                                   │
//! │                                                                         │
//! │  Action                     Checks                    Result            │
//! │  ──────                     ──────                    ──────            │
//! │                                                                         │
//! │  Add { product, qty } ────► qty > 0                                    │
//! │                             product.stock > 0                          │
//! │                             existing + qty <= stock ─► merge / append  │
//! │                                                                         │
//! │  UpdateQuantity ──────────► qty > 0, line exists                       │
//! │                             qty <= snapshot stock ───► replace qty     │
//! │                                                                         │
//! │  Remove { line_id } ──────► line exists ─────────────► drop line       │
//! │                                                                         │
//! │  Clear ───────────────────────────────────────────────► no lines       │
//! │                                                                         │
//! │  Any failed check ────────► Err(CartError), cart unchanged             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock checks run against the product snapshot captured when the line was
//! added. The snapshot can go stale; the server re-checks stock at upsert and
//! again at order creation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CartError;
use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// The line id is the product id, so a product appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    /// Product as it was when last added.
    pub product: Product,
    pub quantity: i64,
    /// Unit price × quantity.
    pub price_cents: i64,
}

impl CartLine {
    fn new(product: Product, quantity: i64) -> Result<Self, CartError> {
        let price_cents = line_price(&product, quantity)?;
        Ok(CartLine {
            id: product.id.clone(),
            product,
            quantity,
            price_cents,
        })
    }

    /// Returns the line price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

fn line_price(product: &Product, quantity: i64) -> Result<i64, CartError> {
    product
        .price()
        .checked_multiply_quantity(quantity)
        .map(|price| price.cents())
        .ok_or_else(|| CartError::AmountTooLarge {
            name: product.name.clone(),
        })
}

// =============================================================================
// Cart Action
// =============================================================================

/// A requested change to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    Add { product: Product, quantity: i64 },
    Remove { line_id: String },
    UpdateQuantity { line_id: String, quantity: i64 },
    Clear,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by product id
/// - Every line quantity is in `1..=product.stock` of its snapshot when
///   written through [`Cart::apply`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Rebuilds a cart from persisted lines, verbatim.
    ///
    /// No stock checks are re-run: a stored cart may hold lines that the
    /// current stock can no longer satisfy. [`Cart::validate`] and the server
    /// catch that at checkout.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Cart { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |total, l| total.saturating_add(l.quantity))
    }

    /// Sum of line prices.
    ///
    /// Saturates at the largest amount for a cart restored with oversized
    /// lines; [`Cart::validate`] rejects such a cart.
    pub fn subtotal(&self) -> Money {
        self.checked_subtotal()
            .unwrap_or_else(|| Money::from_cents(i64::MAX))
    }

    fn checked_subtotal(&self) -> Option<Money> {
        self.lines
            .iter()
            .try_fold(Money::zero(), |total, line| total.checked_add(line.price()))
    }

    /// Rejects a transition whose subtotal no longer fits in cents.
    fn within_limits(self, name: &str) -> Result<Cart, CartError> {
        match self.checked_subtotal() {
            Some(_) => Ok(self),
            None => Err(CartError::AmountTooLarge {
                name: name.to_string(),
            }),
        }
    }

    /// Applies an action and returns the resulting cart.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let cart = Cart::new().apply(CartAction::Add { product, quantity: 3 })?;
    /// assert_eq!(cart.subtotal().cents(), 6000);
    /// ```
    pub fn apply(&self, action: CartAction) -> Result<Cart, CartError> {
        match action {
            CartAction::Add { product, quantity } => self.add(product, quantity),
            CartAction::Remove { line_id } => self.remove(&line_id),
            CartAction::UpdateQuantity { line_id, quantity } => {
                self.update_quantity(&line_id, quantity)
            }
            CartAction::Clear => Ok(Cart::new()),
        }
    }

    fn add(&self, product: Product, quantity: i64) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return Err(CartError::NonPositiveQuantity);
        }

        if product.stock <= 0 {
            return Err(CartError::OutOfStock { name: product.name });
        }

        let existing = self.line(&product.id).map(|l| l.quantity).unwrap_or(0);
        let merged = match existing.checked_add(quantity) {
            Some(total) if total <= product.stock => total,
            _ => {
                return Err(CartError::AddExceedsStock {
                    requested: quantity,
                    remaining: product.stock.saturating_sub(existing),
                })
            }
        };

        let name = product.name.clone();
        let mut next = self.clone();
        match next.lines.iter_mut().find(|l| l.id == product.id) {
            // Merging refreshes the snapshot so later checks see the latest stock
            Some(line) => *line = CartLine::new(product, merged)?,
            None => next.lines.push(CartLine::new(product, quantity)?),
        }
        next.within_limits(&name)
    }

    fn update_quantity(&self, line_id: &str, quantity: i64) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return Err(CartError::NonPositiveQuantity);
        }

        let line = self.line(line_id).ok_or_else(|| CartError::LineNotFound {
            line_id: line_id.to_string(),
        })?;

        if quantity > line.product.stock {
            return Err(CartError::UpdateExceedsStock {
                requested: quantity,
                available: line.product.stock,
            });
        }

        let price_cents = line_price(&line.product, quantity)?;
        let name = line.product.name.clone();

        let mut next = self.clone();
        if let Some(line) = next.lines.iter_mut().find(|l| l.id == line_id) {
            line.quantity = quantity;
            line.price_cents = price_cents;
        }
        next.within_limits(&name)
    }

    fn remove(&self, line_id: &str) -> Result<Cart, CartError> {
        if self.line(line_id).is_none() {
            return Err(CartError::LineNotFound {
                line_id: line_id.to_string(),
            });
        }

        let mut next = self.clone();
        next.lines.retain(|l| l.id != line_id);
        Ok(next)
    }

    /// Checks the whole cart before checkout and returns the first problem.
    ///
    /// ## Rules (per line, in order)
    /// 1. The cart must not be empty
    /// 2. quantity > 0
    /// 3. quantity <= snapshot stock
    /// 4. snapshot stock > 0
    /// 5. line prices and the subtotal fit in cents
    pub fn validate(&self) -> Result<(), CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }

        for line in &self.lines {
            let name = &line.product.name;

            if line.quantity <= 0 {
                return Err(CartError::InvalidLineQuantity { name: name.clone() });
            }

            if line.quantity > line.product.stock {
                return Err(CartError::NotEnoughStock {
                    name: name.clone(),
                    available: line.product.stock,
                });
            }

            if line.product.stock <= 0 {
                return Err(CartError::OutOfStock { name: name.clone() });
            }

            if line.product.price().checked_multiply_quantity(line.quantity).is_none() {
                return Err(CartError::AmountTooLarge { name: name.clone() });
            }
        }

        if self.checked_subtotal().is_none() {
            let name = self.lines.last().map(|l| l.product.name.clone()).unwrap_or_default();
            return Err(CartError::AmountTooLarge { name });
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
