use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;
use super::page::PageRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        let sku_len = self.sku.trim().chars().count();
        if sku_len == 0 || sku_len > 100 {
            return Err(DomainError::InvalidInput(
                "sku must be between 1 and 100 characters".to_string(),
            ));
        }
        let name_len = self.name.trim().chars().count();
        if !(2..=255).contains(&name_len) {
            return Err(DomainError::InvalidInput(
                "name must be between 2 and 255 characters".to_string(),
            ));
        }
        if self.price_cents < 0 {
            return Err(DomainError::InvalidInput(
                "price_cents must be greater than or equal to 0".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(DomainError::InvalidInput(
                "stock must be greater than or equal to 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Administrative update. Does not touch lines of existing orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ProductUpdate {
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.price_cents.is_none() && self.stock.is_none() {
            return Err(DomainError::InvalidInput(
                "at least one of price_cents or stock is required".to_string(),
            ));
        }
        if self.price_cents.is_some_and(|p| p < 0) {
            return Err(DomainError::InvalidInput(
                "price_cents must be greater than or equal to 0".to_string(),
            ));
        }
        if self.stock.is_some_and(|s| s < 0) {
            return Err(DomainError::InvalidInput(
                "stock must be greater than or equal to 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductSearch {
    pub search: Option<String>,
    pub page: PageRequest,
}

impl ProductSearch {
    /// Blank search terms are treated as no filter.
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
