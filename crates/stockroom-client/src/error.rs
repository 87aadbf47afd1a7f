//! # Client Error Types
//!
//! ```text
//! CartError (core) ─────────┐
//! HTTP envelope (4xx/5xx) ──┼──► ClientError ──► shown to the shopper
//! reqwest / io / serde ─────┘
//! ```

use stockroom_core::CartError;
use thiserror::Error;

/// Errors raised by the cart store, the API client and checkout.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A cart transition or cart validation was rejected.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The server answered with an error envelope.
    ///
    /// `message` is the server's own text, e.g. "Quantity exceeds stock".
    #[error("{message}")]
    Api { status: u16, message: String },

    /// No order-item ids were collected during checkout.
    #[error("Failed to create order items")]
    NoOrderItems,

    /// The request never got an answer.
    #[error("Network error: {0}")]
    Network(String),

    /// The answer could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading or writing the stored cart failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status for server-side rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
