use std::sync::Arc;

use crate::domain::customer::CustomerLookupError;
use crate::domain::errors::DomainError;
use crate::domain::order::{validate_items, OrderItemRequest, OrderSearch, OrderSummary, OrderView};
use crate::domain::page::Page;
use crate::domain::ports::{CustomerDirectory, OrderRepository};

/// Runs blocking repository work on the blocking pool.
///
/// The spawned task is detached from the caller: if the request future is
/// dropped mid-flight the transaction still commits or rolls back.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    customers: Arc<dyn CustomerDirectory>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, customers: Arc<dyn CustomerDirectory>) -> Self {
        Self { repo, customers }
    }

    /// The customer check happens before, and outside of, the creation
    /// transaction; a customer removed in between is not detected.
    pub async fn create_order(
        &self,
        customer_id: i64,
        items: Vec<OrderItemRequest>,
        idempotency_key: Option<String>,
    ) -> Result<OrderView, DomainError> {
        if customer_id <= 0 {
            return Err(DomainError::InvalidInput(
                "customer_id must be a positive integer".to_string(),
            ));
        }
        validate_items(&items)?;
        self.ensure_customer(customer_id).await?;

        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.create(customer_id, items, idempotency_key)).await
    }

    pub async fn confirm_order(
        &self,
        order_id: i64,
        idempotency_key: Option<String>,
    ) -> Result<OrderView, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.confirm(order_id, idempotency_key)).await
    }

    pub async fn cancel_order(&self, order_id: i64) -> Result<OrderView, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.cancel(order_id)).await
    }

    pub async fn get_order(&self, order_id: i64) -> Result<OrderView, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.find_by_id(order_id))
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    pub async fn search_orders(
        &self,
        query: OrderSearch,
    ) -> Result<Page<OrderSummary>, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.search(&query)).await
    }

    async fn ensure_customer(&self, customer_id: i64) -> Result<(), DomainError> {
        match self.customers.get_customer(customer_id).await {
            Ok(_) => Ok(()),
            Err(CustomerLookupError::NotFound(_)) => Err(DomainError::CustomerNotFound(customer_id)),
            Err(CustomerLookupError::Unavailable(reason)) => {
                // Reported to the caller as "not found"; only the log differs.
                log::warn!(
                    "Customer {} could not be validated: {}",
                    customer_id,
                    reason
                );
                Err(DomainError::CustomerNotFound(customer_id))
            }
        }
    }
}
