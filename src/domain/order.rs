use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::DomainError;
use super::page::PageRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Created,
    Confirmed,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    /// CREATED moves to CONFIRMED; CONFIRMED stays put; CANCELED is terminal.
    pub fn confirm(self) -> Result<Transition, DomainError> {
        match self {
            OrderStatus::Created => Ok(Transition::Apply),
            OrderStatus::Confirmed => Ok(Transition::AlreadyApplied),
            OrderStatus::Canceled => Err(DomainError::CannotConfirmCanceled),
        }
    }

    /// CREATED can always be canceled. CONFIRMED only while `now` is within
    /// `window` of the confirmation. CANCELED is a no-op.
    pub fn cancel(
        self,
        confirmed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Transition, DomainError> {
        match self {
            OrderStatus::Canceled => Ok(Transition::AlreadyApplied),
            OrderStatus::Created => Ok(Transition::Apply),
            OrderStatus::Confirmed => {
                let confirmed_at = confirmed_at.ok_or_else(|| {
                    DomainError::Internal("confirmed order has no confirmed_at".to_string())
                })?;
                if now - confirmed_at > window {
                    Err(DomainError::CancelWindowExpired {
                        window_minutes: window.num_minutes(),
                    })
                } else {
                    Ok(Transition::Apply)
                }
            }
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "CANCELED" => Ok(OrderStatus::Canceled),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Result of checking a lifecycle command against the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply,
    AlreadyApplied,
}

/// Tunables of the order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub cancel_window: Duration,
    pub idempotency_ttl: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            cancel_window: Duration::minutes(10),
            idempotency_ttl: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub qty: i32,
}

pub fn validate_items(items: &[OrderItemRequest]) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::InvalidInput(
            "items must contain at least 1 item".to_string(),
        ));
    }
    for item in items {
        if item.product_id <= 0 {
            return Err(DomainError::InvalidInput(
                "product_id must be a positive integer".to_string(),
            ));
        }
        if item.qty <= 0 {
            return Err(DomainError::InvalidInput(
                "qty must be a positive integer".to_string(),
            ));
        }
    }
    Ok(())
}

/// Items in the order their product rows must be locked: ascending product
/// id, so two orders over overlapping products never wait on each other in
/// a cycle.
pub fn reservation_order(items: &[OrderItemRequest]) -> Vec<OrderItemRequest> {
    let mut ordered = items.to_vec();
    ordered.sort_by_key(|item| item.product_id);
    ordered
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    pub product_id: i64,
    pub qty: i32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Header and lines of an order about to be inserted, priced from the
/// snapshots taken while reserving stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub customer_id: i64,
    pub total_cents: i64,
    pub lines: Vec<LineDraft>,
}

impl OrderDraft {
    /// Lines follow the request order. Every product must have a captured
    /// price in `unit_prices`.
    pub fn price(
        customer_id: i64,
        items: &[OrderItemRequest],
        unit_prices: &HashMap<i64, i64>,
    ) -> Result<Self, DomainError> {
        let mut total_cents: i64 = 0;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let unit_price_cents = *unit_prices.get(&item.product_id).ok_or_else(|| {
                DomainError::Internal(format!("product {} was not reserved", item.product_id))
            })?;
            let subtotal_cents = unit_price_cents
                .checked_mul(i64::from(item.qty))
                .ok_or_else(|| DomainError::InvalidInput("order total overflows".to_string()))?;
            total_cents = total_cents
                .checked_add(subtotal_cents)
                .ok_or_else(|| DomainError::InvalidInput("order total overflows".to_string()))?;
            lines.push(LineDraft {
                product_id: item.product_id,
                qty: item.qty,
                unit_price_cents,
                subtotal_cents,
            });
        }
        Ok(Self {
            customer_id,
            total_cents,
            lines,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderLineView {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub qty: i32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Full order as returned by create/get/confirm/cancel. This is also the
/// payload stored behind idempotency keys, so its serialized form is what
/// replays hand back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderLineView>,
}

/// Order header as listed by search (no lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderSearch {
    pub status: Option<OrderStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: PageRequest,
}

impl OrderSearch {
    pub fn matches(&self, order: &OrderSummary) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self.from.map_or(true, |from| order.created_at >= from)
            && self.to.map_or(true, |to| order.created_at <= to)
    }
}
