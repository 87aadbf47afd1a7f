//! # Discount Service
//!
//! Looks up a code and turns it into order totals.
//!
//! ```text
//! " save10 " ──► normalize ──► "SAVE10" ──► discounts.get_by_code
//!                                                  │
//!                                   discount::resolve(found, now)
//!                                   active && expires_at > now ?
//!                                        │                 │
//!                                        ▼                 ▼
//!                              order_totals(total, d)    400 "Invalid or
//!                              6000 × (1 − 10%) = 5400    expired discount code"
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use stockroom_core::discount::{self, order_totals, OrderTotals};
use stockroom_core::validation::{normalize_discount_code, validate_total_cents};
use stockroom_core::{Discount, Money, ValidationError};
use stockroom_db::Database;
use tracing::debug;

use crate::error::ApiResult;

/// Body of `POST /discounts/apply`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDiscountRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub total_cents: Option<i64>,
}

/// Result of applying a code to a total. Nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub discount: Discount,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Finds a code that can be redeemed right now.
pub async fn lookup(db: &Database, code: &str) -> ApiResult<Discount> {
    let code = normalize_discount_code(code)?;
    let found = db.discounts().get_by_code(&code).await?;

    let discount = discount::resolve(found, &code, Utc::now())?;
    debug!(code = %discount.code, percentage = discount.percentage, "Discount resolved");
    Ok(discount)
}

/// Resolves an optional code against a total.
///
/// Without a code the discounted total equals the total.
pub async fn totals_for(
    db: &Database,
    total: Money,
    code: Option<&str>,
) -> ApiResult<(Option<Discount>, OrderTotals)> {
    match code {
        Some(code) => {
            let discount = lookup(db, code).await?;
            let totals = order_totals(total, Some(&discount));
            Ok((Some(discount), totals))
        }
        None => Ok((None, order_totals(total, None))),
    }
}

/// Previews a code against a total.
pub async fn apply(db: &Database, request: ApplyDiscountRequest) -> ApiResult<AppliedDiscount> {
    let (code, total_cents) = match (request.code, request.total_cents) {
        (Some(code), Some(total)) => (code, total),
        _ => return Err(ValidationError::MissingFields.into()),
    };
    validate_total_cents(total_cents)?;

    let discount = lookup(db, &code).await?;
    let totals = order_totals(Money::from_cents(total_cents), Some(&discount));

    Ok(AppliedDiscount { discount, totals })
}
