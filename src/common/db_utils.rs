// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Traducción de violaciones de restricciones de SQLite
// ---
// SQLite informa la columna en el mensaje: "UNIQUE constraint failed: Entrada.NroCorte".

pub(crate) fn is_unique_violation_on(e: &sqlx::Error, column: &str) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation() && db_err.message().contains(column),
        _ => false,
    }
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Conversión genérica para altas/bajas de catálogo: clave duplicada -> 409,
/// registro referenciado -> 409, el resto -> 500.
pub(crate) fn map_catalog_error(e: sqlx::Error, what: &str) -> AppError {
    if is_unique_violation(&e) {
        return AppError::Conflict(what.to_string());
    }
    if is_foreign_key_violation(&e) {
        return AppError::InUse(what.to_string());
    }
    e.into()
}
