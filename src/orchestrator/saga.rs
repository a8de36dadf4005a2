//! Create-and-confirm saga across the customer registry and the orders API.
//!
//! The steps run strictly in sequence and the first failure ends the run.
//! There is no compensation. A failed confirmation leaves the order CREATED, and the
//! caller is expected to retry the whole saga with the same idempotency key:
//! creation replays the existing order and confirmation replays its result.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::customer::{Customer, CustomerLookupError};
use crate::domain::idempotency;
use crate::domain::order::{validate_items, OrderItemRequest, OrderView};
use crate::domain::ports::CustomerDirectory;

use super::gateway::{GatewayError, OrdersGateway};

#[derive(Debug, Clone)]
pub struct SagaRequest {
    pub customer_id: i64,
    pub items: Vec<OrderItemRequest>,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SagaOutcome {
    pub customer: Customer,
    pub order: OrderView,
}

#[derive(Debug, Error)]
pub enum SagaError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Customer not found")]
    CustomerNotFound(i64),

    #[error("Customer not found or service unavailable")]
    CustomerUnavailable(String),

    #[error("{reason}")]
    CreateRejected { reason: String },

    /// The order exists and stays CREATED.
    #[error("{reason}")]
    ConfirmRejected { order_id: i64, reason: String },
}

pub struct OrderOrchestrator {
    customers: Arc<dyn CustomerDirectory>,
    orders: Arc<dyn OrdersGateway>,
}

impl OrderOrchestrator {
    pub fn new(customers: Arc<dyn CustomerDirectory>, orders: Arc<dyn OrdersGateway>) -> Self {
        Self { customers, orders }
    }

    pub async fn create_and_confirm(&self, request: &SagaRequest) -> Result<SagaOutcome, SagaError> {
        validate(request)?;
        let key = request.idempotency_key.trim();

        log::info!("Step 1: validating customer {}", request.customer_id);
        let customer = self
            .customers
            .get_customer(request.customer_id)
            .await
            .map_err(|e| match e {
                CustomerLookupError::NotFound(id) => SagaError::CustomerNotFound(id),
                CustomerLookupError::Unavailable(reason) => {
                    log::warn!("Customer validation failed: {}", reason);
                    SagaError::CustomerUnavailable(reason)
                }
            })?;

        log::info!("Step 2: creating order for customer {}", customer.id);
        let created = self
            .orders
            .create_order(request.customer_id, &request.items, key)
            .await
            .map_err(|e| {
                log::warn!("Order creation failed: {}", e);
                SagaError::CreateRejected {
                    reason: reason_or(&e, "Failed to create order"),
                }
            })?;

        log::info!("Step 3: confirming order {}", created.id);
        let order = self
            .orders
            .confirm_order(created.id, key)
            .await
            .map_err(|e| {
                log::warn!(
                    "Order {} left in CREATED state, confirmation failed: {}",
                    created.id,
                    e
                );
                SagaError::ConfirmRejected {
                    order_id: created.id,
                    reason: reason_or(&e, "Failed to confirm order"),
                }
            })?;

        log::info!("Order {} confirmed for customer {}", order.id, customer.id);
        Ok(SagaOutcome { customer, order })
    }
}

fn validate(request: &SagaRequest) -> Result<(), SagaError> {
    if request.customer_id <= 0 {
        return Err(SagaError::InvalidInput(
            "customer_id must be a positive integer".to_string(),
        ));
    }
    validate_items(&request.items).map_err(|e| SagaError::InvalidInput(e.to_string()))?;
    let key = request.idempotency_key.trim();
    if key.is_empty() {
        return Err(SagaError::InvalidInput(
            "idempotency_key is required".to_string(),
        ));
    }
    idempotency::validate_key(key).map_err(|e| SagaError::InvalidInput(e.to_string()))
}

fn reason_or(err: &GatewayError, fallback: &str) -> String {
    err.message().unwrap_or(fallback).to_string()
}
