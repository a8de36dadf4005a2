use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::page::Page;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product, ProductSearch, ProductUpdate};
use crate::schema::products;

use super::models::{NewProductRow, ProductChangeset, ProductRow};

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for DieselProductRepository {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        product.validate()?;
        let mut conn = self.pool.get()?;

        let sku = product.sku.trim();
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                sku,
                name: product.name.trim(),
                price_cents: product.price_cents,
                stock: product.stock,
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Conflict(format!("SKU {sku} already exists"))
                }
                other => other.into(),
            })?;

        log::info!("Created product {} ({})", row.id, row.sku);
        Ok(row.into())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn update(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, DomainError> {
        update.validate()?;
        let mut conn = self.pool.get()?;

        let row = diesel::update(products::table.find(id))
            .set(&ProductChangeset {
                price_cents: update.price_cents,
                stock: update.stock,
                updated_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn search(&self, query: &ProductSearch) -> Result<Page<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut statement = products::table.select(ProductRow::as_select()).into_boxed();
        if let Some(term) = query.term() {
            let pattern = format!("%{term}%");
            statement = statement.filter(
                products::sku
                    .ilike(pattern.clone())
                    .or(products::name.ilike(pattern)),
            );
        }

        let rows: Vec<ProductRow> = statement
            .order(products::id.desc())
            .limit(query.page.limit)
            .offset(query.page.offset)
            .load(&mut conn)?;

        Ok(Page::new(
            rows.into_iter().map(Product::from).collect(),
            &query.page,
        ))
    }
}
