use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Customer record as served by the customer registry's internal lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Why a customer lookup produced no customer.
///
/// Order creation treats both variants as "customer not found"; only the
/// logs and the orchestrator's message tell them apart.
#[derive(Debug, Error)]
pub enum CustomerLookupError {
    #[error("customer {0} not found")]
    NotFound(i64),

    #[error("customer registry unavailable: {0}")]
    Unavailable(String),
}
