use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::OrderItemRequest;
use crate::orchestrator::{OrderOrchestrator, SagaError, SagaOutcome, SagaRequest};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAndConfirmRequest {
    pub customer_id: i64,
    pub items: Vec<OrderItemRequest>,
    /// Reused for creation and confirmation; retry the saga with the same key.
    pub idempotency_key: String,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SagaResponse {
    success: bool,
    #[serde(rename = "correlationId")]
    correlation_id: String,
    data: SagaOutcome,
}

/// A saga failure tagged with the correlation id of the run.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SagaFailure {
    correlation_id: String,
    error: SagaError,
}

impl ResponseError for SagaFailure {
    fn status_code(&self) -> StatusCode {
        match self.error {
            SagaError::CustomerNotFound(_) | SagaError::CustomerUnavailable(_) => {
                StatusCode::NOT_FOUND
            }
            SagaError::InvalidInput(_)
            | SagaError::CreateRejected { .. }
            | SagaError::ConfirmRejected { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.error.to_string(),
            "correlationId": self.correlation_id,
        }))
    }
}

/// POST /orchestrator/orders
///
/// Validates the customer, creates the order and confirms it, in that order.
/// A failed confirmation leaves the order CREATED; retrying with the same
/// `idempotency_key` finishes it without creating a second order.
#[utoipa::path(
    post,
    path = "/orchestrator/orders",
    request_body = CreateAndConfirmRequest,
    responses(
        (status = 201, description = "Order created and confirmed", body = SagaOutcome),
        (status = 400, description = "Invalid input, or creation/confirmation rejected"),
        (status = 404, description = "Customer not found or registry unavailable"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orchestrator"
)]
pub async fn create_and_confirm_order(
    orchestrator: web::Data<OrderOrchestrator>,
    body: web::Json<CreateAndConfirmRequest>,
) -> Result<HttpResponse, SagaFailure> {
    let body = body.into_inner();
    let correlation_id = body
        .correlation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    log::info!(
        "Orchestrating order for customer {} (correlation {})",
        body.customer_id,
        correlation_id
    );

    let request = SagaRequest {
        customer_id: body.customer_id,
        items: body.items,
        idempotency_key: body.idempotency_key,
    };
    match orchestrator.create_and_confirm(&request).await {
        Ok(outcome) => Ok(HttpResponse::Created().json(SagaResponse {
            success: true,
            correlation_id,
            data: outcome,
        })),
        Err(error) => {
            log::warn!("Saga {} failed: {}", correlation_id, error);
            Err(SagaFailure {
                correlation_id,
                error,
            })
        }
    }
}
