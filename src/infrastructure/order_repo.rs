use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::idempotency::{self, IdempotencyScope};
use crate::domain::order::{
    reservation_order, validate_items, LifecyclePolicy, OrderDraft, OrderItemRequest, OrderSearch,
    OrderStatus, OrderSummary, OrderView, Transition,
};
use crate::domain::page::Page;
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, orders, products};

use super::idempotency_store;
use super::inventory;
use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
    policy: LifecyclePolicy,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool, policy: LifecyclePolicy) -> Self {
        Self { pool, policy }
    }
}

/// Takes the row lock on an order for the rest of the transaction.
fn lock_order(conn: &mut PgConnection, order_id: i64) -> Result<OrderRow, DomainError> {
    orders::table
        .find(order_id)
        .select(OrderRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or(DomainError::OrderNotFound(order_id))
}

fn load_view(conn: &mut PgConnection, order_id: i64) -> Result<Option<OrderView>, DomainError> {
    let order = orders::table
        .find(order_id)
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };

    let lines: Vec<(OrderItemRow, String, String)> = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq(order.id))
        .order(order_items::id.asc())
        .select((OrderItemRow::as_select(), products::name, products::sku))
        .load(conn)?;

    let items = lines
        .into_iter()
        .map(|(line, name, sku)| line.into_view(name, sku))
        .collect();
    order.into_view(items).map(Some)
}

fn require_view(conn: &mut PgConnection, order_id: i64) -> Result<OrderView, DomainError> {
    load_view(conn, order_id)?.ok_or(DomainError::OrderNotFound(order_id))
}

fn replay_creation(
    conn: &mut PgConnection,
    key: &str,
    customer_id: i64,
) -> Result<Option<OrderView>, DomainError> {
    idempotency_store::lookup(conn, key, IdempotencyScope::OrderCreation)?
        .map(|record| record.replay_for_customer(customer_id))
        .transpose()
}

fn replay_confirmation(
    conn: &mut PgConnection,
    key: &str,
    order_id: i64,
) -> Result<Option<OrderView>, DomainError> {
    idempotency_store::lookup(conn, key, IdempotencyScope::OrderConfirmation)?
        .map(|record| record.replay_for_order(order_id))
        .transpose()
}

impl OrderRepository for DieselOrderRepository {
    fn create(
        &self,
        customer_id: i64,
        items: Vec<OrderItemRequest>,
        idempotency_key: Option<String>,
    ) -> Result<OrderView, DomainError> {
        validate_items(&items)?;
        if let Some(key) = idempotency_key.as_deref() {
            idempotency::validate_key(key)?;
        }
        let mut conn = self.pool.get()?;

        if let Some(key) = idempotency_key.as_deref() {
            if let Some(view) = replay_creation(&mut conn, key, customer_id)? {
                log::debug!("Replaying creation of order {} for key {}", view.id, key);
                return Ok(view);
            }
        }

        let result = conn.transaction::<_, DomainError, _>(|conn| {
            // 0. Same-key retries wait here, not on the product rows
            if let Some(key) = idempotency_key.as_deref() {
                idempotency_store::claim(conn, key, IdempotencyScope::OrderCreation)?;
                if let Some(view) = replay_creation(conn, key, customer_id)? {
                    return Ok((view, true));
                }
            }

            // 1. Reserve stock, one locked product row at a time
            let mut unit_prices = HashMap::with_capacity(items.len());
            for item in reservation_order(&items) {
                let price = inventory::reserve_stock(conn, item.product_id, item.qty)?;
                unit_prices.insert(item.product_id, price);
            }
            let draft = OrderDraft::price(customer_id, &items, &unit_prices)?;

            // 2. Insert the order header
            let now = Utc::now();
            let order_id: i64 = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    customer_id,
                    status: OrderStatus::Created.as_str(),
                    total_cents: draft.total_cents,
                    created_at: now,
                    updated_at: now,
                })
                .returning(orders::id)
                .get_result(conn)?;

            // 3. Insert the lines with their price snapshots
            let new_lines: Vec<NewOrderItemRow> = draft
                .lines
                .iter()
                .map(|l| NewOrderItemRow {
                    order_id,
                    product_id: l.product_id,
                    qty: l.qty,
                    unit_price_cents: l.unit_price_cents,
                    subtotal_cents: l.subtotal_cents,
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&new_lines)
                .execute(conn)?;

            let view = require_view(conn, order_id)?;

            // 4. Record the key last so a lost race undoes the reservations too
            if let Some(key) = idempotency_key.as_deref() {
                idempotency_store::put(
                    conn,
                    key,
                    IdempotencyScope::OrderCreation,
                    order_id,
                    &view,
                    now + self.policy.idempotency_ttl,
                )?;
            }
            Ok((view, false))
        });

        match (result, idempotency_key.as_deref()) {
            (Err(DomainError::DuplicateIdempotencyKey(_)), Some(key)) => {
                log::debug!("Lost creation race on key {}, replaying winner", key);
                replay_creation(&mut conn, key, customer_id)?.ok_or_else(|| {
                    DomainError::Internal(format!("idempotency key {key} vanished"))
                })
            }
            (Ok((view, true)), _) => {
                log::debug!("Replaying creation of order {} after waiting on its key", view.id);
                Ok(view)
            }
            (Ok((view, false)), _) => {
                log::info!(
                    "Created order {} for customer {} ({} cents)",
                    view.id,
                    customer_id,
                    view.total_cents
                );
                Ok(view)
            }
            (Err(e), _) => Err(e),
        }
    }

    fn confirm(
        &self,
        order_id: i64,
        idempotency_key: Option<String>,
    ) -> Result<OrderView, DomainError> {
        if let Some(key) = idempotency_key.as_deref() {
            idempotency::validate_key(key)?;
        }
        let mut conn = self.pool.get()?;

        if let Some(key) = idempotency_key.as_deref() {
            if let Some(view) = replay_confirmation(&mut conn, key, order_id)? {
                log::debug!("Replaying confirmation of order {} for key {}", order_id, key);
                return Ok(view);
            }
        }

        let result = conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, order_id)?;

            // A concurrent holder of the lock may have recorded this key.
            if let Some(key) = idempotency_key.as_deref() {
                if let Some(view) = replay_confirmation(conn, key, order_id)? {
                    return Ok(view);
                }
            }

            let status: OrderStatus = order.status.parse()?;
            let now = Utc::now();
            let view = match status.confirm()? {
                Transition::AlreadyApplied => {
                    log::debug!("Order {} already confirmed", order_id);
                    require_view(conn, order_id)?
                }
                Transition::Apply => {
                    diesel::update(orders::table.find(order_id))
                        .set((
                            orders::status.eq(OrderStatus::Confirmed.as_str()),
                            orders::confirmed_at.eq(Some(now)),
                            orders::updated_at.eq(now),
                        ))
                        .execute(conn)?;
                    log::info!("Confirmed order {}", order_id);
                    require_view(conn, order_id)?
                }
            };

            if let Some(key) = idempotency_key.as_deref() {
                idempotency_store::put(
                    conn,
                    key,
                    IdempotencyScope::OrderConfirmation,
                    order_id,
                    &view,
                    now + self.policy.idempotency_ttl,
                )?;
            }
            Ok(view)
        });

        match (result, idempotency_key.as_deref()) {
            (Err(DomainError::DuplicateIdempotencyKey(_)), Some(key)) => {
                replay_confirmation(&mut conn, key, order_id)?.ok_or_else(|| {
                    DomainError::Internal(format!("idempotency key {key} vanished"))
                })
            }
            (result, _) => result,
        }
    }

    fn cancel(&self, order_id: i64) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, order_id)?;
            let status: OrderStatus = order.status.parse()?;
            let now = Utc::now();

            match status.cancel(order.confirmed_at, now, self.policy.cancel_window)? {
                Transition::AlreadyApplied => {
                    log::debug!("Order {} already canceled", order_id);
                }
                Transition::Apply => {
                    let lines: Vec<(i64, i32)> = order_items::table
                        .filter(order_items::order_id.eq(order_id))
                        .select((order_items::product_id, order_items::qty))
                        .order(order_items::product_id.asc())
                        .load(conn)?;
                    for (product_id, qty) in lines {
                        inventory::restore_stock(conn, product_id, qty)?;
                    }

                    diesel::update(orders::table.find(order_id))
                        .set((
                            orders::status.eq(OrderStatus::Canceled.as_str()),
                            orders::canceled_at.eq(Some(now)),
                            orders::updated_at.eq(now),
                        ))
                        .execute(conn)?;
                    log::info!("Canceled order {} (was {})", order_id, status);
                }
            }

            require_view(conn, order_id)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        load_view(&mut conn, id)
    }

    fn search(&self, query: &OrderSearch) -> Result<Page<OrderSummary>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut statement = orders::table.select(OrderRow::as_select()).into_boxed();
        if let Some(status) = query.status {
            statement = statement.filter(orders::status.eq(status.as_str()));
        }
        if let Some(from) = query.from {
            statement = statement.filter(orders::created_at.ge(from));
        }
        if let Some(to) = query.to {
            statement = statement.filter(orders::created_at.le(to));
        }

        let rows: Vec<OrderRow> = statement
            .order(orders::id.desc())
            .limit(query.page.limit)
            .offset(query.page.offset)
            .load(&mut conn)?;

        let items = rows
            .into_iter()
            .map(OrderSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, &query.page))
    }
}
