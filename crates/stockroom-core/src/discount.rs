//! # Discount Resolution
//!
//! Turns an optional discount code into the totals stored on an order.
//!
//! ```text
//! code (optional)
//!    │
//!    ├── None ───────────────────────────► discounted_total = total
//!    │
//!    └── Some("save10")
//!          │ normalize → "SAVE10"
//!          ▼
//!        lookup by code (stockroom-db)
//!          │
//!          ▼
//!        resolve(found, now) ← THIS MODULE
//!          │
//!          ├── missing / inactive / expired ─► "Invalid or expired discount code"
//!          │
//!          └── ok ──► discounted_total = total − total × pct / 100
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Discount;

/// Pre- and post-discount totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub total: Money,
    pub discounted_total: Money,
}

/// Accepts a looked-up discount only if it can be redeemed at `now`.
///
/// `code` is the normalized code that was searched for; it is carried in the
/// error for logging.
pub fn resolve(found: Option<Discount>, code: &str, now: DateTime<Utc>) -> CoreResult<Discount> {
    match found {
        Some(discount) if discount.is_redeemable(now) => Ok(discount),
        _ => Err(CoreError::InvalidDiscount {
            code: code.to_string(),
        }),
    }
}

/// Computes the order totals, rounding the discount half-up to the cent.
///
/// ## Example
/// ```rust
/// use stockroom_core::discount::order_totals;
/// use stockroom_core::Money;
///
/// let totals = order_totals(Money::from_cents(6000), None);
/// assert_eq!(totals.discounted_total.cents(), 6000);
/// ```
pub fn order_totals(total: Money, discount: Option<&Discount>) -> OrderTotals {
    let discounted_total = match discount {
        Some(d) => total.apply_percentage_discount(d.rate().bps()),
        None => total,
    };

    OrderTotals {
        total,
        discounted_total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn save(pct: i64, is_active: bool, expires_in: Duration) -> Discount {
        let now = Utc::now();
        Discount {
            id: "d-1".to_string(),
            code: "SAVE10".to_string(),
            percentage: pct,
            is_active,
            expires_at: now + expires_in,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ten_percent_of_sixty() {
        let d = save(10, true, Duration::days(7));
        let totals = order_totals(Money::from_cents(6000), Some(&d));
        assert_eq!(totals.total.cents(), 6000);
        assert_eq!(totals.discounted_total.cents(), 5400);
    }

    #[test]
    fn test_discounted_total_never_exceeds_total() {
        for pct in 1..=100 {
            let d = save(pct, true, Duration::days(1));
            for cents in [0, 1, 99, 1001, 6000, 123_457] {
                let totals = order_totals(Money::from_cents(cents), Some(&d));
                assert!(totals.discounted_total <= totals.total);
                assert!(!totals.discounted_total.is_negative());
            }
        }
    }

    #[test]
    fn test_no_code_keeps_total() {
        let totals = order_totals(Money::from_cents(1234), None);
        assert_eq!(totals.discounted_total, totals.total);
    }

    #[test]
    fn test_resolve_rejects_unusable_codes() {
        let now = Utc::now();

        assert!(resolve(Some(save(10, true, Duration::hours(1))), "SAVE10", now).is_ok());

        for found in [
            None,
            Some(save(10, false, Duration::hours(1))),
            Some(save(10, true, Duration::hours(-1))),
        ] {
            let err = resolve(found, "SAVE10", now).unwrap_err();
            assert_eq!(err.to_string(), "Invalid or expired discount code");
        }
    }
}
