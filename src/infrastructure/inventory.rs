//! Stock reservation against the `products` table.
//!
//! Both functions must run inside the caller's transaction: the row lock
//! taken by [`reserve_stock`] is held until that transaction ends.

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::domain::errors::DomainError;
use crate::schema::products;

/// Locks the product row, checks availability and decrements stock by `qty`.
///
/// Returns the unit price at the moment of reservation.
pub fn reserve_stock(conn: &mut PgConnection, product_id: i64, qty: i32) -> Result<i64, DomainError> {
    let row: Option<(i64, i32)> = products::table
        .find(product_id)
        .select((products::price_cents, products::stock))
        .for_update()
        .first(conn)
        .optional()?;

    let (price_cents, stock) = row.ok_or(DomainError::ProductNotFound(product_id))?;
    if stock < qty {
        return Err(DomainError::InsufficientStock {
            product_id,
            requested: qty,
            available: stock,
        });
    }

    diesel::update(products::table.find(product_id))
        .set((
            products::stock.eq(products::stock - qty),
            products::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    Ok(price_cents)
}

/// Puts `qty` units back on the shelf. Only used when canceling.
pub fn restore_stock(conn: &mut PgConnection, product_id: i64, qty: i32) -> Result<(), DomainError> {
    let updated = diesel::update(products::table.find(product_id))
        .set((
            products::stock.eq(products::stock + qty),
            products::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(DomainError::ProductNotFound(product_id));
    }
    Ok(())
}
