pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod orchestrator;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use application::product_service::ProductService;
use config::Config;
use infrastructure::customer_client::HttpCustomerDirectory;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::product_repo::DieselProductRepository;
use orchestrator::{HttpOrdersGateway, OrderOrchestrator};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::search_orders,
        handlers::orders::confirm_order,
        handlers::orders::cancel_order,
        handlers::products::create_product,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::search_products,
    ),
    tags(
        (name = "orders", description = "Order lifecycle"),
        (name = "products", description = "Product catalogue and stock"),
    )
)]
pub struct ApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::orchestrator::create_and_confirm_order),
    tags((name = "orchestrator", description = "Create-and-confirm saga"))
)]
pub struct OrchestratorApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), BoxError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Order and product routes, plus extractor settings that keep rejected
/// requests in the `{success, error}` envelope.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use handlers::{orders, products};

    cfg.app_data(handlers::json_config())
        .app_data(handlers::query_config())
        .app_data(handlers::path_config())
        .service(
            web::scope("/orders")
                .route("", web::post().to(orders::create_order))
                .route("", web::get().to(orders::search_orders))
                .route("/{id}", web::get().to(orders::get_order))
                .route("/{id}/confirm", web::post().to(orders::confirm_order))
                .route("/{id}/cancel", web::post().to(orders::cancel_order)),
        )
        .service(
            web::scope("/products")
                .route("", web::post().to(products::create_product))
                .route("", web::get().to(products::search_products))
                .route("/{id}", web::get().to(products::get_product))
                .route("/{id}", web::patch().to(products::update_product)),
        );
}

pub fn orchestrator_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config()).route(
        "/orchestrator/orders",
        web::post().to(handlers::orchestrator::create_and_confirm_order),
    );
}

/// Build the orders API server bound to `config.host:config.port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(config: &Config, pool: DbPool) -> std::io::Result<actix_web::dev::Server> {
    let customers = HttpCustomerDirectory::new(&config.customers, config.http_timeout)
        .map_err(std::io::Error::other)?;
    let orders = web::Data::new(OrderService::new(
        Arc::new(DieselOrderRepository::new(pool.clone(), config.lifecycle)),
        Arc::new(customers),
    ));
    let products = web::Data::new(ProductService::new(Arc::new(DieselProductRepository::new(
        pool,
    ))));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(orders.clone())
            .app_data(products.clone())
            .wrap(Logger::default())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run())
}

/// Build the orchestrator server. It owns no database; it reaches the
/// customer registry and the orders API over HTTP.
pub fn build_orchestrator_server(config: &Config) -> std::io::Result<actix_web::dev::Server> {
    let customers = HttpCustomerDirectory::new(&config.customers, config.http_timeout)
        .map_err(std::io::Error::other)?;
    let orders = HttpOrdersGateway::new(&config.orders_api_base, config.http_timeout)
        .map_err(std::io::Error::other)?;
    let orchestrator = web::Data::new(OrderOrchestrator::new(
        Arc::new(customers),
        Arc::new(orders),
    ));
    let openapi = OrchestratorApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(orchestrator.clone())
            .wrap(Logger::default())
            .configure(orchestrator_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run())
}
