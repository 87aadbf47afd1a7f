//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client (cart)                                                │
//! │  ├── Quantity and snapshot-stock checks                                │
//! │  └── Immediate shopper feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: API handler (Rust)                                           │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0, price_cents >= 0)                              │
//! │  ├── UNIQUE (product name, discount code, open owner+product)          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use stockroom_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Widget").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_DISCOUNT_PERCENT, MAX_PRICE_CENTS, MAX_QUANTITY, MAX_STOCK, MIN_DISCOUNT_PERCENT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required, length-bounded text field and returns it trimmed.
fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Widget").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required_text("name", name, 200)
}

/// Validates a category name (non-empty, at most 100 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    required_text("name", name, 100)
}

/// Validates a product image URL.
///
/// Images are hosted elsewhere; only an http(s) URL is accepted here.
pub fn validate_image_url(url: &str) -> ValidationResult<String> {
    let url = required_text("image", url, 2048)?;

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidFormat {
            field: "image".to_string(),
            reason: "must be an http(s) URL".to_string(),
        });
    }

    Ok(url)
}

/// Validates a username (3-50 characters, letters, digits, `_`, `-`, `.`).
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = required_text("username", username, 50)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must be at least 3 characters".to_string(),
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '.', '_' and '-'".to_string(),
        });
    }

    Ok(username)
}

/// Validates an email address and returns it lowercased.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_email;
///
/// assert_eq!(validate_email(" Ada@Example.com ").unwrap(), "ada@example.com");
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = required_text("email", email, 254)?.to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(email)
}

/// Validates a password (8-128 characters). Not trimmed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    let len = password.chars().count();
    if !(8..=128).contains(&len) {
        return Err(ValidationError::OutOfRange {
            field: "password length".to_string(),
            min: 8,
            max: 128,
        });
    }

    Ok(())
}

/// Normalizes and validates a discount code: trimmed and uppercased.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::normalize_discount_code;
///
/// assert_eq!(normalize_discount_code(" save10 ").unwrap(), "SAVE10");
/// ```
pub fn normalize_discount_code(code: &str) -> ValidationResult<String> {
    Ok(required_text("code", code, 50)?.to_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order or cart quantity.
///
/// ```text
/// POST /orderItems/add { quantity: 0 }
///      │
///      ▼
/// validate_quantity(0) ← THIS FUNCTION
///      │
///      ├── qty <= 0? → Error: "quantity must be positive"
///      ├── qty > MAX_QUANTITY? → Error: out of range
///      │
///      └── OK → stock check against the product
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items), anything above
/// [`MAX_PRICE_CENTS`] is not.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level (`0..=MAX_STOCK`).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates an order total in cents (non-negative).
pub fn validate_total_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount percentage (1-100).
pub fn validate_discount_percentage(pct: i64) -> ValidationResult<()> {
    if !(MIN_DISCOUNT_PERCENT..=MAX_DISCOUNT_PERCENT).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: MIN_DISCOUNT_PERCENT,
            max: MAX_DISCOUNT_PERCENT,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates every id in a reference list, reporting the first bad one.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_reference_ids;
///
/// let err = validate_reference_ids("orderItem", &["abc".to_string()]).unwrap_err();
/// assert_eq!(err.to_string(), "Invalid orderItem ID: abc");
/// ```
pub fn validate_reference_ids(field: &str, ids: &[String]) -> ValidationResult<()> {
    for id in ids {
        if uuid::Uuid::parse_str(id).is_err() {
            return Err(ValidationError::InvalidReference {
                field: field.to_string(),
                value: id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert_eq!(validate_product_name("  Widget ").unwrap(), "Widget");
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_image_url() {
        assert!(validate_image_url("https://img.example.com/w.png").is_ok());
        assert!(validate_image_url("ftp://img.example.com/w.png").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_stock_and_price() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());

        assert!(validate_stock(MAX_STOCK).is_ok());
        assert!(validate_stock(MAX_STOCK + 1).is_err());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(i64::MAX / 2).is_err());
    }

    #[test]
    fn test_validate_discount_percentage() {
        assert!(validate_discount_percentage(1).is_ok());
        assert!(validate_discount_percentage(100).is_ok());
        assert!(validate_discount_percentage(0).is_err());
        assert!(validate_discount_percentage(101).is_err());
    }

    #[test]
    fn test_normalize_discount_code() {
        assert_eq!(normalize_discount_code("save10").unwrap(), "SAVE10");
        assert!(normalize_discount_code("  ").is_err());
    }

    #[test]
    fn test_validate_credentials() {
        assert!(validate_username("ada_l").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("ada lovelace").is_err());
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_reference_ids() {
        let good = uuid::Uuid::new_v4().to_string();
        assert!(validate_reference_ids("orderItem", &[good.clone()]).is_ok());

        let err = validate_reference_ids("orderItem", &[good, "nope".to_string()]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidReference { ref value, .. } if value == "nope"));
    }
}
