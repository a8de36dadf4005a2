use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::page::Page;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product, ProductSearch, ProductUpdate};

use super::order_service::run_blocking;

/// Catalogue administration. Stock changes made here bypass reservations and
/// never touch existing order lines.
#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.create(product)).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.find_by_id(id))
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    pub async fn update_product(
        &self,
        id: i64,
        update: ProductUpdate,
    ) -> Result<Product, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.update(id, update))
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    pub async fn search_products(&self, query: ProductSearch) -> Result<Page<Product>, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.search(&query)).await
    }
}
