use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::idempotency::IDEMPOTENCY_HEADER;
use crate::domain::order::{OrderItemRequest, OrderView};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The orders API answered with a non-success status or envelope.
    #[error(
        "orders API rejected the request ({status}): {}",
        message.as_deref().unwrap_or("no message")
    )]
    Rejected { status: u16, message: Option<String> },

    /// No usable answer: refused connection, timeout or unreadable body.
    #[error("orders API unreachable: {0}")]
    Transport(String),
}

impl GatewayError {
    /// The orders API's own error message, when it sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            GatewayError::Rejected { message, .. } => message.as_deref(),
            GatewayError::Transport(_) => None,
        }
    }
}

/// The two order lifecycle commands the saga drives remotely.
#[async_trait]
pub trait OrdersGateway: Send + Sync {
    async fn create_order(
        &self,
        customer_id: i64,
        items: &[OrderItemRequest],
        idempotency_key: &str,
    ) -> Result<OrderView, GatewayError>;

    async fn confirm_order(
        &self,
        order_id: i64,
        idempotency_key: &str,
    ) -> Result<OrderView, GatewayError>;
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    customer_id: i64,
    items: &'a [OrderItemRequest],
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpOrdersGateway {
    client: Client,
    base_url: String,
}

impl HttpOrdersGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_order(response: Response) -> Result<OrderView, GatewayError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.error);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<OrderView> = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Transport(format!("unreadable response: {e}")))?;
        match envelope {
            Envelope {
                success: true,
                data: Some(order),
                ..
            } => Ok(order),
            Envelope { error, .. } => Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: error,
            }),
        }
    }
}

#[async_trait]
impl OrdersGateway for HttpOrdersGateway {
    async fn create_order(
        &self,
        customer_id: i64,
        items: &[OrderItemRequest],
        idempotency_key: &str,
    ) -> Result<OrderView, GatewayError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(&CreateOrderBody { customer_id, items })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::read_order(response).await
    }

    async fn confirm_order(
        &self,
        order_id: i64,
        idempotency_key: &str,
    ) -> Result<OrderView, GatewayError> {
        let response = self
            .client
            .post(format!("{}/orders/{}/confirm", self.base_url, order_id))
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::read_order(response).await
    }
}
