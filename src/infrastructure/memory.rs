//! In-memory stand-in for the Postgres store, used by handler, service and
//! orchestrator tests. One mutex guards everything, so every call is trivially
//! atomic; the transactional behavior under real row locks is covered by the
//! diesel repository tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};

use crate::domain::errors::DomainError;
use crate::domain::idempotency::{self, IdempotencyRecord, IdempotencyScope, STATUS_COMPLETED};
use crate::domain::order::{
    reservation_order, validate_items, LifecyclePolicy, OrderDraft, OrderItemRequest,
    OrderLineView, OrderSearch, OrderStatus, OrderSummary, OrderView, Transition,
};
use crate::domain::page::Page;
use crate::domain::ports::{OrderRepository, ProductRepository};
use crate::domain::product::{NewProduct, Product, ProductSearch, ProductUpdate};

#[derive(Debug, Default)]
struct State {
    products: HashMap<i64, Product>,
    orders: HashMap<i64, OrderView>,
    idempotency: HashMap<(String, IdempotencyScope), IdempotencyRecord>,
    next_product_id: i64,
    next_order_id: i64,
    next_line_id: i64,
}

impl State {
    fn view(&self, order_id: i64) -> Result<OrderView, DomainError> {
        self.orders
            .get(&order_id)
            .cloned()
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    fn record(
        &mut self,
        key: &str,
        scope: IdempotencyScope,
        view: &OrderView,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let now = Utc::now();
        let record = IdempotencyRecord {
            key: key.to_string(),
            scope,
            target_id: view.id,
            status: STATUS_COMPLETED.to_string(),
            response_body: serde_json::to_value(view)
                .map_err(|e| DomainError::Internal(e.to_string()))?,
            created_at: now,
            expires_at: now + ttl,
        };
        self.idempotency.insert((key.to_string(), scope), record);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    policy: LifecyclePolicy,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory store poisoned")
    }

    pub fn seed_product(&self, sku: &str, price_cents: i64, stock: i32) -> i64 {
        ProductRepository::create(
            self,
            NewProduct {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                price_cents,
                stock,
            },
        )
        .expect("seed product")
        .id
    }

    pub fn stock_of(&self, product_id: i64) -> i32 {
        self.lock().products[&product_id].stock
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Moves an order's confirmation `minutes` into the past.
    pub fn backdate_confirmation(&self, order_id: i64, minutes: i64) {
        let mut state = self.lock();
        let order = state.orders.get_mut(&order_id).expect("order exists");
        order.confirmed_at = Some(Utc::now() - Duration::minutes(minutes));
    }
}

impl OrderRepository for InMemoryStore {
    fn create(
        &self,
        customer_id: i64,
        items: Vec<OrderItemRequest>,
        idempotency_key: Option<String>,
    ) -> Result<OrderView, DomainError> {
        validate_items(&items)?;
        let mut state = self.lock();

        if let Some(key) = idempotency_key.as_deref() {
            idempotency::validate_key(key)?;
            if let Some(record) = state
                .idempotency
                .get(&(key.to_string(), IdempotencyScope::OrderCreation))
            {
                return record.replay_for_customer(customer_id);
            }
        }

        // Work on a copy of the stock so a failure leaves nothing behind.
        let mut stock: HashMap<i64, i32> = HashMap::new();
        let mut unit_prices = HashMap::new();
        for item in reservation_order(&items) {
            let product = state
                .products
                .get(&item.product_id)
                .ok_or(DomainError::ProductNotFound(item.product_id))?;
            let available = *stock.entry(item.product_id).or_insert(product.stock);
            if available < item.qty {
                return Err(DomainError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.qty,
                    available,
                });
            }
            stock.insert(item.product_id, available - item.qty);
            unit_prices.insert(item.product_id, product.price_cents);
        }
        let draft = OrderDraft::price(customer_id, &items, &unit_prices)?;

        let now = Utc::now();
        for (product_id, remaining) in stock {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock = remaining;
                product.updated_at = now;
            }
        }

        state.next_order_id += 1;
        let order_id = state.next_order_id;
        let mut lines = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            state.next_line_id += 1;
            let product = &state.products[&line.product_id];
            lines.push(OrderLineView {
                id: state.next_line_id,
                product_id: line.product_id,
                product_name: product.name.clone(),
                sku: product.sku.clone(),
                qty: line.qty,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.subtotal_cents,
            });
        }
        let view = OrderView {
            id: order_id,
            customer_id,
            status: OrderStatus::Created,
            total_cents: draft.total_cents,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            canceled_at: None,
            items: lines,
        };
        state.orders.insert(order_id, view.clone());

        if let Some(key) = idempotency_key.as_deref() {
            state.record(
                key,
                IdempotencyScope::OrderCreation,
                &view,
                self.policy.idempotency_ttl,
            )?;
        }
        Ok(view)
    }

    fn confirm(
        &self,
        order_id: i64,
        idempotency_key: Option<String>,
    ) -> Result<OrderView, DomainError> {
        let mut state = self.lock();

        if let Some(key) = idempotency_key.as_deref() {
            idempotency::validate_key(key)?;
            if let Some(record) = state
                .idempotency
                .get(&(key.to_string(), IdempotencyScope::OrderConfirmation))
            {
                return record.replay_for_order(order_id);
            }
        }

        let current = state.view(order_id)?;
        let view = match current.status.confirm()? {
            Transition::AlreadyApplied => current,
            Transition::Apply => {
                let now = Utc::now();
                let order = state
                    .orders
                    .get_mut(&order_id)
                    .ok_or(DomainError::OrderNotFound(order_id))?;
                order.status = OrderStatus::Confirmed;
                order.confirmed_at = Some(now);
                order.updated_at = now;
                order.clone()
            }
        };

        if let Some(key) = idempotency_key.as_deref() {
            state.record(
                key,
                IdempotencyScope::OrderConfirmation,
                &view,
                self.policy.idempotency_ttl,
            )?;
        }
        Ok(view)
    }

    fn cancel(&self, order_id: i64) -> Result<OrderView, DomainError> {
        let mut state = self.lock();
        let current = state.view(order_id)?;
        let now = Utc::now();

        match current
            .status
            .cancel(current.confirmed_at, now, self.policy.cancel_window)?
        {
            Transition::AlreadyApplied => Ok(current),
            Transition::Apply => {
                for line in &current.items {
                    let product = state
                        .products
                        .get_mut(&line.product_id)
                        .ok_or(DomainError::ProductNotFound(line.product_id))?;
                    product.stock += line.qty;
                    product.updated_at = now;
                }
                let order = state
                    .orders
                    .get_mut(&order_id)
                    .ok_or(DomainError::OrderNotFound(order_id))?;
                order.status = OrderStatus::Canceled;
                order.canceled_at = Some(now);
                order.updated_at = now;
                Ok(order.clone())
            }
        }
    }

    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError> {
        Ok(self.lock().orders.get(&id).cloned())
    }

    fn search(&self, query: &OrderSearch) -> Result<Page<OrderSummary>, DomainError> {
        let state = self.lock();
        let mut matching: Vec<OrderSummary> = state
            .orders
            .values()
            .map(|o| OrderSummary {
                id: o.id,
                customer_id: o.customer_id,
                status: o.status,
                total_cents: o.total_cents,
                created_at: o.created_at,
                confirmed_at: o.confirmed_at,
                canceled_at: o.canceled_at,
            })
            .filter(|o| query.matches(o))
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let items = matching
            .into_iter()
            .skip(query.page.offset as usize)
            .take(query.page.limit as usize)
            .collect();
        Ok(Page::new(items, &query.page))
    }
}

impl ProductRepository for InMemoryStore {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        product.validate()?;
        let mut state = self.lock();
        let sku = product.sku.trim().to_string();
        if state.products.values().any(|p| p.sku == sku) {
            return Err(DomainError::Conflict(format!("SKU {sku} already exists")));
        }

        state.next_product_id += 1;
        let now = Utc::now();
        let created = Product {
            id: state.next_product_id,
            sku,
            name: product.name.trim().to_string(),
            price_cents: product.price_cents,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(created.id, created.clone());
        Ok(created)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    fn update(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, DomainError> {
        update.validate()?;
        let mut state = self.lock();
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(price_cents) = update.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    fn search(&self, query: &ProductSearch) -> Result<Page<Product>, DomainError> {
        let state = self.lock();
        let term = query.term().map(str::to_lowercase);
        let mut matching: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                term.as_deref().map_or(true, |t| {
                    p.sku.to_lowercase().contains(t) || p.name.to_lowercase().contains(t)
                })
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let items = matching
            .into_iter()
            .skip(query.page.offset as usize)
            .take(query.page.limit as usize)
            .collect();
        Ok(Page::new(items, &query.page))
    }
}
