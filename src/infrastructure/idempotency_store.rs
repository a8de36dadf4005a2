//! Persistence for idempotency keys. Records are never evicted here;
//! `expires_at` is left for an external cleanup job.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;

use crate::domain::errors::DomainError;
use crate::domain::idempotency::{IdempotencyRecord, IdempotencyScope, STATUS_COMPLETED};
use crate::domain::order::OrderView;
use crate::schema::idempotency_keys;

use super::models::{IdempotencyKeyRow, NewIdempotencyKeyRow};

pub fn lookup(
    conn: &mut PgConnection,
    key: &str,
    scope: IdempotencyScope,
) -> Result<Option<IdempotencyRecord>, DomainError> {
    idempotency_keys::table
        .find((key, scope.as_str()))
        .select(IdempotencyKeyRow::as_select())
        .first(conn)
        .optional()?
        .map(IdempotencyRecord::try_from)
        .transpose()
}

/// Takes a transaction-scoped advisory lock on `(scope, key)`.
///
/// Concurrent transactions using the same key queue here, before touching any
/// product or order row, and each sees the previous holder's committed record.
pub fn claim(conn: &mut PgConnection, key: &str, scope: IdempotencyScope) -> Result<(), DomainError> {
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1 || ':' || $2))")
        .bind::<Text, _>(scope.as_str())
        .bind::<Text, _>(key)
        .execute(conn)?;
    Ok(())
}

/// Records `view` as the result guarded by `key`.
///
/// Fails with [`DomainError::DuplicateIdempotencyKey`] when the key is taken;
/// the enclosing transaction must then roll back and the caller re-read the
/// winning record.
pub fn put(
    conn: &mut PgConnection,
    key: &str,
    scope: IdempotencyScope,
    target_id: i64,
    view: &OrderView,
    expires_at: DateTime<Utc>,
) -> Result<(), DomainError> {
    let response_body = serde_json::to_value(view)
        .map_err(|e| DomainError::Internal(format!("cannot serialize order: {e}")))?;

    let inserted = diesel::insert_into(idempotency_keys::table)
        .values(&NewIdempotencyKeyRow {
            key,
            target_type: scope.as_str(),
            target_id,
            status: STATUS_COMPLETED,
            response_body,
            expires_at,
        })
        .on_conflict_do_nothing()
        .execute(conn)?;

    if inserted == 0 {
        return Err(DomainError::DuplicateIdempotencyKey(key.to_string()));
    }
    Ok(())
}
