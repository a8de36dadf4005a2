use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Customer not found")]
    CustomerNotFound(i64),

    #[error("Order not found")]
    OrderNotFound(i64),

    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("Cannot confirm a canceled order")]
    CannotConfirmCanceled,

    #[error("Cannot cancel order confirmed more than {window_minutes} minutes ago")]
    CancelWindowExpired { window_minutes: i64 },

    #[error("Idempotency key '{key}' was already used for another request")]
    IdempotencyKeyMismatch { key: String },

    /// Lost the insert race on an idempotency key; callers replay the winner.
    #[error("Idempotency key '{0}' already exists")]
    DuplicateIdempotencyKey(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
