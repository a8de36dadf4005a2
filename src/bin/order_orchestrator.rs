use dotenvy::dotenv;
use order_lifecycle::build_orchestrator_server;
use order_lifecycle::config::{Config, DEFAULT_ORCHESTRATOR_PORT};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env(DEFAULT_ORCHESTRATOR_PORT).map_err(std::io::Error::other)?;

    log::info!(
        "Starting orchestrator at http://{}:{} (customers: {}, orders: {})",
        config.host,
        config.port,
        config.customers.base_url,
        config.orders_api_base
    );

    build_orchestrator_server(&config)?.await
}
