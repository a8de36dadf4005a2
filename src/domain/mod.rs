pub mod customer;
pub mod errors;
pub mod idempotency;
pub mod order;
pub mod page;
pub mod ports;
pub mod product;
