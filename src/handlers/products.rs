use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::application::product_service::ProductService;
use crate::domain::page::PageRequest;
use crate::domain::product::{NewProduct, Product, ProductSearch, ProductUpdate};
use crate::errors::AppError;

use super::{ApiResponse, PageResponse};

#[derive(Debug, Deserialize)]
pub struct SearchProductsParams {
    pub search: Option<String>,
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "SKU already exists"),
    ),
    tag = "products"
)]
pub async fn create_product(
    service: web::Data<ProductService>,
    body: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
    let product = service.create_product(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(product)))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    service: web::Data<ProductService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let product = service.get_product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(product)))
}

/// PATCH /products/{id}
///
/// Changes price and/or stock. Existing order lines keep the price they
/// were created with.
#[utoipa::path(
    patch,
    path = "/products/{id}",
    request_body = ProductUpdate,
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product(
    service: web::Data<ProductService>,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
) -> Result<HttpResponse, AppError> {
    let product = service
        .update_product(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(product)))
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive match on sku or name"),
        ("cursor" = Option<i64>, Query, description = "Offset, default 0"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20, max 100"),
    ),
    responses(
        (status = 200, description = "Page of products", body = [Product]),
    ),
    tag = "products"
)]
pub async fn search_products(
    service: web::Data<ProductService>,
    query: web::Query<SearchProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let search = ProductSearch {
        search: params.search,
        page: PageRequest::new(params.cursor, params.limit),
    };
    let page = service.search_products(search).await?;
    Ok(HttpResponse::Ok().json(PageResponse::from(page)))
}
