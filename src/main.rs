use dotenvy::dotenv;
use order_lifecycle::config::{Config, DEFAULT_ORDERS_PORT};
use order_lifecycle::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env(DEFAULT_ORDERS_PORT).map_err(std::io::Error::other)?;
    let database_url = config.database_url().map_err(std::io::Error::other)?;

    let pool = create_pool(database_url).map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    log::info!("Starting orders API at http://{}:{}", config.host, config.port);
    log::info!(
        "Cancel window {} min, idempotency TTL {} h",
        config.lifecycle.cancel_window.num_minutes(),
        config.lifecycle.idempotency_ttl.num_hours()
    );

    build_server(&config, pool)?.await
}
