use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::domain::errors::DomainError;
use crate::domain::idempotency::IdempotencyRecord;
use crate::domain::order::{OrderLineView, OrderSummary, OrderView};
use crate::domain::product::Product;
use crate::schema::{idempotency_keys, order_items, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i64,
    pub customer_id: i64,
    pub status: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    pub fn into_view(self, items: Vec<OrderLineView>) -> Result<OrderView, DomainError> {
        Ok(OrderView {
            id: self.id,
            customer_id: self.customer_id,
            status: self.status.parse()?,
            total_cents: self.total_cents,
            created_at: self.created_at,
            updated_at: self.updated_at,
            confirmed_at: self.confirmed_at,
            canceled_at: self.canceled_at,
            items,
        })
    }
}

impl TryFrom<OrderRow> for OrderSummary {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(OrderSummary {
            id: row.id,
            customer_id: row.customer_id,
            status: row.status.parse()?,
            total_cents: row.total_cents,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            canceled_at: row.canceled_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub customer_id: i64,
    pub status: &'a str,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub qty: i32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItemRow {
    pub fn into_view(self, product_name: String, sku: String) -> OrderLineView {
        OrderLineView {
            id: self.id,
            product_id: self.product_id,
            product_name,
            sku,
            qty: self.qty,
            unit_price_cents: self.unit_price_cents,
            subtotal_cents: self.subtotal_cents,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub order_id: i64,
    pub product_id: i64,
    pub qty: i32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            price_cents: row.price_cents,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow<'a> {
    pub sku: &'a str,
    pub name: &'a str,
    pub price_cents: i64,
    pub stock: i32,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset {
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = idempotency_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IdempotencyKeyRow {
    pub key: String,
    pub target_type: String,
    pub target_id: i64,
    pub status: String,
    pub response_body: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<IdempotencyKeyRow> for IdempotencyRecord {
    type Error = DomainError;

    fn try_from(row: IdempotencyKeyRow) -> Result<Self, Self::Error> {
        Ok(IdempotencyRecord {
            key: row.key,
            scope: row.target_type.parse()?,
            target_id: row.target_id,
            status: row.status,
            response_body: row.response_body,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = idempotency_keys)]
pub struct NewIdempotencyKeyRow<'a> {
    pub key: &'a str,
    pub target_type: &'a str,
    pub target_id: i64,
    pub status: &'a str,
    pub response_body: Value,
    pub expires_at: DateTime<Utc>,
}
