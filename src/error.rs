//! Domain error taxonomy shared by every service.
//!
//! Each variant carries a machine-stable [`Error::kind`]; the HTTP layer maps
//! variants onto status codes in `http::error`.

use uuid::Uuid;

use crate::auth::AuthError;
use crate::models::OrderStatus;
use crate::TransactionError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// The resource does not exist or is not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: Uuid },

    #[error("Order cannot be cancelled in its current status")]
    OrderNotCancellable,

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Admin access required")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] TransactionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable identifier exposed to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::EmptyCart => "empty_cart",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::OrderNotCancellable => "order_not_cancellable",
            Self::InvalidStatus(_) => "invalid_status",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::Persistence(_) => "persistence_failure",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(TransactionError::Database(err))
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::WeakPassword(msg) | AuthError::InvalidEmail(msg) => Self::Validation(msg),
            AuthError::Hashing(_) | AuthError::Signing(_) => Self::Internal(err.to_string()),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reject blank strings, returning the trimmed value.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
