//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Order / discount / stock rule violations       │
//! │  ├── CartError        - Rejected cart transitions                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (api-server)                                               │
//! │  └── ApiError         - What HTTP callers see (JSON envelope)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations in the order workflow.
/// The API layer maps each variant to an HTTP status.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order-item cannot be found.
    #[error("Order item not found: {0}")]
    OrderItemNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Requested quantity is larger than the product's stock.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /orderItems/add { product, quantity: 5 }
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// QuantityExceedsStock { product: "Widget", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 400 "Quantity exceeds stock"
    /// ```
    #[error("Quantity exceeds stock for {product}: available {available}, requested {requested}")]
    QuantityExceedsStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The conditional stock decrement at order creation could not be applied.
    #[error("Insufficient stock for product {product_id}: cannot remove {requested}")]
    InsufficientStock { product_id: String, requested: i64 },

    /// An order already claimed this order-item.
    #[error("Order item is part of an order: {0}")]
    OrderItemAlreadyOrdered(String),

    /// The discount code is unknown, inactive or expired.
    #[error("Invalid or expired discount code")]
    InvalidDiscount { code: String },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Cart Error
// =============================================================================

/// Reasons a cart transition or cart validation is rejected.
///
/// Messages are written for direct display to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Adding would push the line past the snapshot stock.
    #[error("Cannot add {requested} more. Only {remaining} available.")]
    AddExceedsStock { requested: i64, remaining: i64 },

    /// Setting a quantity above the snapshot stock.
    #[error("Cannot set quantity to {requested}. Only {available} available.")]
    UpdateExceedsStock { requested: i64, available: i64 },

    #[error("Item not found in cart")]
    LineNotFound { line_id: String },

    #[error("Your cart is empty")]
    Empty,

    #[error("Invalid quantity for {name}")]
    InvalidLineQuantity { name: String },

    #[error("Not enough stock for {name}. Only {available} available.")]
    NotEnoughStock { name: String, available: i64 },

    /// Price × quantity (or the cart subtotal) does not fit in cents.
    #[error("Amount too large for {name}")]
    AmountTooLarge { name: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Several required fields were checked together.
    #[error("Please provide all required fields")]
    MissingFields,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A computed amount does not fit in the money type.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An id in a reference list is not a well-formed identifier.
    #[error("Invalid {field} ID: {value}")]
    InvalidReference { field: String, value: String },

    /// Duplicate value (e.g., duplicate product name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityExceedsStock {
            product: "Widget".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Quantity exceeds stock for Widget: available 3, requested 5"
        );

        let err = CoreError::InvalidDiscount {
            code: "SAVE10".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid or expired discount code");
    }

    #[test]
    fn test_cart_error_messages() {
        let err = CartError::AddExceedsStock {
            requested: 15,
            remaining: 10,
        };
        assert_eq!(err.to_string(), "Cannot add 15 more. Only 10 available.");
        assert_eq!(CartError::Empty.to_string(), "Your cart is empty");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvalidReference {
            field: "orderItem".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid orderItem ID: abc");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::MissingFields.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Please provide all required fields");
    }
}
