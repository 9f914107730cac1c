// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Errores de dominio y de almacenamiento. Los handlers los convierten a
// `ApiError` (con el idioma del cliente) mediante `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] ValidationErrors),

    #[error("Faltan campos requeridos: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("{entity} no encontrado: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("El NroCorte '{0}' ya existe")]
    DuplicateCorte(String),

    #[error("Ya existe una entrada abierta ({0:?})")]
    OpenEntryExists(Option<i64>),

    #[error("Conflicto de clave única: {0}")]
    Conflict(String),

    #[error("Registro referenciado: {0}")]
    InUse(String),

    #[error("La entrada {0} no tiene detalle")]
    EntryWithoutDetails(i64),

    #[error("Stock insuficiente para {product}: disponible {available}, solicitado {requested}")]
    InsufficientStock {
        product: String,
        available: f64,
        requested: f64,
    },

    #[error("No se puede revertir stock de {product}: disponible {available}, a revertir {reverted}")]
    StockReversalUnderflow {
        product: String,
        available: f64,
        reverted: f64,
    },

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Usuario inactivo")]
    InactiveUser,

    #[error("Contraseña actual incorrecta")]
    WrongCurrentPassword,

    #[error("Error de base de datos: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Error interno del servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Status HTTP de cada variante.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingFields(_)
            | AppError::EntryWithoutDetails(_)
            | AppError::InsufficientStock { .. }
            | AppError::StockReversalUnderflow { .. }
            | AppError::WrongCurrentPassword => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InactiveUser => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::DuplicateCorte(_)
            | AppError::OpenEntryExists(_)
            | AppError::Conflict(_)
            | AppError::InUse(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        let (key, args): (&str, Vec<(&str, String)>) = match self {
            AppError::ValidationError(errors) => {
                return ApiError {
                    status,
                    error: store.translate(lang, "validation", &[]),
                    details: Some(validation_details(errors)),
                };
            }
            AppError::MissingFields(fields) => ("missing_fields", vec![("fields", fields.join(", "))]),
            AppError::NotFound { entity, key } => {
                ("not_found", vec![("entity", entity.to_string()), ("key", key.clone())])
            }
            AppError::DuplicateCorte(corte) => ("duplicate_corte", vec![("corte", corte.clone())]),
            AppError::OpenEntryExists(numero) => (
                "open_entry_exists",
                vec![("numero", numero.map(|n| n.to_string()).unwrap_or_else(|| "?".into()))],
            ),
            AppError::Conflict(what) => ("conflict", vec![("what", what.clone())]),
            AppError::InUse(what) => ("in_use", vec![("what", what.clone())]),
            AppError::EntryWithoutDetails(numero) => {
                ("entry_without_details", vec![("numero", numero.to_string())])
            }
            AppError::InsufficientStock { product, available, requested } => (
                "insufficient_stock",
                vec![
                    ("product", product.clone()),
                    ("available", available.to_string()),
                    ("requested", requested.to_string()),
                ],
            ),
            AppError::StockReversalUnderflow { product, available, reverted } => (
                "stock_reversal_underflow",
                vec![
                    ("product", product.clone()),
                    ("available", available.to_string()),
                    ("reverted", reverted.to_string()),
                ],
            ),
            AppError::InvalidCredentials => ("invalid_credentials", vec![]),
            AppError::InactiveUser => ("inactive_user", vec![]),
            AppError::WrongCurrentPassword => ("wrong_current_password", vec![]),

            // Todo lo demás es 500: se loguea el detalle y el cliente recibe un mensaje genérico.
            e => {
                tracing::error!("Error interno del servidor: {}", e);
                ("internal", vec![])
            }
        };

        ApiError {
            status,
            error: store.translate(lang, key, &args),
            details: None,
        }
    }
}

// Aplana los errores del validator (incluidos los de listas anidadas) en
// claves del estilo "productos_seleccionados[0].cantidad".
fn validation_details(errors: &ValidationErrors) -> Value {
    let mut details = BTreeMap::new();
    collect_messages(errors, "", &mut details);
    json!(details)
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

// Sobre JSON que recibe el cliente: {"error": "...", "details": {...}}
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Extrae un campo obligatorio ya validado; si falta, responde 400.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::MissingFields(vec![field.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(lang: &str) -> Locale {
        Locale(lang.to_string())
    }

    #[test]
    fn insufficient_stock_is_bad_request_with_spanish_message() {
        let store = I18nStore::new();
        let err = AppError::InsufficientStock {
            product: "pr001".into(),
            available: 10.0,
            requested: 50.0,
        };
        let api = err.to_api_error(&locale("es"), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.error.contains("Stock insuficiente"));
        assert!(api.error.contains("pr001"));
        assert!(api.error.contains("50"));
    }

    #[test]
    fn status_mapping_covers_taxonomy() {
        assert_eq!(AppError::DuplicateCorte("C-1".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::not_found("Entrada", 3).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EntryWithoutDetails(1).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InactiveUser.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::new();
        let api = AppError::DatabaseError(sqlx::Error::PoolTimedOut).to_api_error(&locale("es"), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("pool"));
    }
}
