use async_trait::async_trait;

use super::customer::{Customer, CustomerLookupError};
use super::errors::DomainError;
use super::order::{OrderItemRequest, OrderSearch, OrderSummary, OrderView};
use super::page::Page;
use super::product::{NewProduct, Product, ProductSearch, ProductUpdate};

/// The order lifecycle engine. Each mutating call is one atomic unit of
/// work: it commits completely or leaves no trace.
pub trait OrderRepository: Send + Sync + 'static {
    /// Reserves stock for every item and persists the order with status
    /// CREATED. With a key, a repeated call replays the first result.
    fn create(
        &self,
        customer_id: i64,
        items: Vec<OrderItemRequest>,
        idempotency_key: Option<String>,
    ) -> Result<OrderView, DomainError>;

    fn confirm(&self, order_id: i64, idempotency_key: Option<String>)
        -> Result<OrderView, DomainError>;

    fn cancel(&self, order_id: i64) -> Result<OrderView, DomainError>;

    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError>;

    fn search(&self, query: &OrderSearch) -> Result<Page<OrderSummary>, DomainError>;
}

pub trait ProductRepository: Send + Sync + 'static {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError>;
    fn update(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, DomainError>;
    fn search(&self, query: &ProductSearch) -> Result<Page<Product>, DomainError>;
}

/// Lookup-only view of the customer registry.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get_customer(&self, id: i64) -> Result<Customer, CustomerLookupError>;
}
