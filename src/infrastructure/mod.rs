pub mod customer_client;
pub mod idempotency_store;
pub mod inventory;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod order_repo;
pub mod product_repo;
