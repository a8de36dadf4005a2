use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::application::order_service::OrderService;
use crate::domain::idempotency::IDEMPOTENCY_HEADER;
use crate::domain::order::{OrderItemRequest, OrderSearch, OrderStatus, OrderSummary, OrderView};
use crate::domain::page::PageRequest;
use crate::errors::AppError;

use super::{ApiResponse, PageResponse};

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SearchOrdersParams {
    pub status: Option<String>,
    /// Inclusive lower bound on `created_at` (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at` (RFC 3339).
    pub to: Option<DateTime<Utc>>,
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchOrdersParams {
    fn into_search(self) -> Result<OrderSearch, AppError> {
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.to_uppercase().parse::<OrderStatus>())
            .transpose()?;
        Ok(OrderSearch {
            status,
            from: self.from,
            to: self.to,
            page: PageRequest::new(self.cursor, self.limit),
        })
    }
}

/// Reads the optional idempotency header. Blank values count as absent.
fn idempotency_key(req: &HttpRequest) -> Result<Option<String>, AppError> {
    let Some(value) = req.headers().get(IDEMPOTENCY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("{IDEMPOTENCY_HEADER} must be ASCII")))?
        .trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates the customer, then reserves stock for every item and stores the
/// order in one transaction. Any failing item leaves stock untouched.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    params(
        ("X-Idempotency-Key" = Option<String>, Header, description = "Replays the first creation for this key"),
    ),
    responses(
        (status = 201, description = "Order created", body = OrderView),
        (status = 400, description = "Invalid input or insufficient stock"),
        (status = 404, description = "Customer or product not found"),
        (status = 409, description = "Idempotency key used by another customer"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let key = idempotency_key(&req)?;
    let body = body.into_inner();

    let order = service
        .create_order(body.customer_id, body.items, key)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(order)))
}

/// GET /orders/{id}
///
/// Returns the order together with its lines.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i64, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderView),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order = service.get_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}

/// GET /orders
///
/// Newest first. `cursor` is the offset returned by the previous page.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("status" = Option<String>, Query, description = "CREATED, CONFIRMED or CANCELED"),
        ("from" = Option<String>, Query, description = "Created at or after (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Created at or before (RFC 3339)"),
        ("cursor" = Option<i64>, Query, description = "Offset, default 0"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20, max 100"),
    ),
    responses(
        (status = 200, description = "Page of orders (without lines)", body = [OrderSummary]),
        (status = 400, description = "Invalid filter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn search_orders(
    service: web::Data<OrderService>,
    query: web::Query<SearchOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let search = query.into_inner().into_search()?;
    let page = service.search_orders(search).await?;
    Ok(HttpResponse::Ok().json(PageResponse::from(page)))
}

/// POST /orders/{id}/confirm
///
/// With `X-Idempotency-Key`, a repeated call returns the stored result of the
/// first confirmation.
#[utoipa::path(
    post,
    path = "/orders/{id}/confirm",
    params(
        ("id" = i64, Path, description = "Order id"),
        ("X-Idempotency-Key" = Option<String>, Header, description = "Makes retries replay the first result"),
    ),
    responses(
        (status = 200, description = "Order confirmed (or already confirmed)", body = OrderView),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order canceled, or key bound to another order"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn confirm_order(
    service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let key = idempotency_key(&req)?;
    let order = service.confirm_order(path.into_inner(), key).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}

/// POST /orders/{id}/cancel
///
/// Restores stock for every line. Confirmed orders can only be canceled
/// within the cancellation window.
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    params(
        ("id" = i64, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order canceled (or already canceled)", body = OrderView),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Cancellation window expired"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    service: web::Data<OrderService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order = service.cancel_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}
