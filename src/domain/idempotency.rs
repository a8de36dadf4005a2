use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::errors::DomainError;
use super::order::OrderView;

pub const MAX_KEY_LEN: usize = 255;

/// Request header carrying the caller's key on create and confirm.
pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

/// What an idempotency key guards. Keys are unique per scope, so the same
/// caller token can protect both the creation and the confirmation of one
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdempotencyScope {
    OrderCreation,
    OrderConfirmation,
}

impl IdempotencyScope {
    pub fn as_str(self) -> &'static str {
        match self {
            IdempotencyScope::OrderCreation => "order_creation",
            IdempotencyScope::OrderConfirmation => "order_confirmation",
        }
    }
}

impl fmt::Display for IdempotencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdempotencyScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_creation" => Ok(IdempotencyScope::OrderCreation),
            "order_confirmation" => Ok(IdempotencyScope::OrderConfirmation),
            other => Err(DomainError::Internal(format!(
                "unknown idempotency target type '{other}'"
            ))),
        }
    }
}

pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    pub key: String,
    pub scope: IdempotencyScope,
    pub target_id: i64,
    pub status: String,
    pub response_body: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Stored confirmation result, provided the key was recorded for `order_id`.
    pub fn replay_for_order(&self, order_id: i64) -> Result<OrderView, DomainError> {
        if self.target_id != order_id {
            return Err(DomainError::IdempotencyKeyMismatch {
                key: self.key.clone(),
            });
        }
        self.stored_view()
    }

    /// Stored creation result, provided it was created for `customer_id`.
    pub fn replay_for_customer(&self, customer_id: i64) -> Result<OrderView, DomainError> {
        let view = self.stored_view()?;
        if view.customer_id != customer_id {
            return Err(DomainError::IdempotencyKeyMismatch {
                key: self.key.clone(),
            });
        }
        Ok(view)
    }

    fn stored_view(&self) -> Result<OrderView, DomainError> {
        serde_json::from_value(self.response_body.clone())
            .map_err(|e| DomainError::Internal(format!("corrupt idempotency payload: {e}")))
    }
}

pub fn validate_key(key: &str) -> Result<(), DomainError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(DomainError::InvalidInput(format!(
            "idempotency key must be between 1 and {MAX_KEY_LEN} characters"
        )));
    }
    Ok(())
}
