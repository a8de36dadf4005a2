pub mod gateway;
pub mod saga;

pub use gateway::{GatewayError, HttpOrdersGateway, OrdersGateway};
pub use saga::{OrderOrchestrator, SagaError, SagaOutcome, SagaRequest};
