//! Pre-write checks shared by every entity service
//!
//! Shape checks run on the request alone. Uniqueness and reference checks run
//! on the same transaction handle as the write that follows them; the UNIQUE
//! column constraints remain as the backstop for check-then-write races.

use std::future::Future;
use std::pin::Pin;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, Iterable,
    PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter, TransactionTrait,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Field must contain at least one non-whitespace character
pub fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub fn max_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must not exceed {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn len_between(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

pub fn max_len_opt(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

/// Blank optional keys are stored as NULL so they never collide
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fails with `AlreadyExists` if another row of `E` holds `value` in `column`.
/// `exclude` is the id of the row being updated.
pub async fn ensure_unique<E, C>(
    conn: &C,
    entity: &'static str,
    field: &'static str,
    column: E::Column,
    value: &str,
    exclude: Option<Uuid>,
) -> AppResult<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut query = E::find().filter(column.eq(value));
    if let Some(id) = exclude {
        if let Some(pk) = E::PrimaryKey::iter().next() {
            query = query.filter(pk.into_column().ne(id));
        }
    }

    if query.one(conn).await?.is_some() {
        tracing::debug!("Duplicate {} {}: {}", entity, field, value);
        return Err(AppError::AlreadyExists { entity, field });
    }
    Ok(())
}

/// Fails with `ReferenceNotFound` if `id` is set but no row of `E` has it
pub async fn ensure_reference<E, C, K>(
    conn: &C,
    entity: &'static str,
    field: &'static str,
    id: Option<K>,
) -> AppResult<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
    K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let Some(id) = id else {
        return Ok(());
    };

    if E::find_by_id(id).one(conn).await?.is_none() {
        return Err(AppError::ReferenceNotFound { entity, field });
    }
    Ok(())
}

/// Run `work` inside one transaction. Any error rolls the whole unit back;
/// storage-level failures come out as `StorageConflict`.
pub async fn atomically<T, F>(db: &DatabaseConnection, work: F) -> AppResult<T>
where
    T: Send,
    F: for<'c> FnOnce(
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>
        + Send,
{
    db.transaction::<F, T, AppError>(work)
        .await
        .map_err(|err| {
            let err = AppError::from(err);
            if let AppError::StorageConflict(detail) = &err {
                tracing::error!("Transaction rolled back: {}", detail);
            }
            err
        })
}
