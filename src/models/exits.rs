// src/models/exits.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{common::lenient, models::entries::validate_positive};

// Fila plana de la tabla Salida, clave (SalNumero, Item).
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "PascalCase")]
pub struct ExitRow {
    pub sal_numero: i64,
    pub item: i64,
    pub rel_numero: i64,
    pub prod_codigo: String,
    pub prod_nombre: Option<String>,
    pub nro_corte: Option<String>,
    pub serie: Option<i64>,
    pub cantidad: f64,
    pub usuario_creacion: Option<String>,
    pub fecha_creacion: NaiveDateTime,
    pub estado: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ExitItem {
    pub item: i64,
    pub rel_numero: i64,
    pub prod_codigo: String,
    pub prod_nombre: Option<String>,
    pub nro_corte: Option<String>,
    pub serie: Option<i64>,
    pub cantidad: f64,
    pub estado: String,
}

// Salida agrupada: cabecera + ítems.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Exit {
    pub sal_numero: i64,
    pub fecha_creacion: NaiveDateTime,
    pub usuario_creacion: Option<String>,
    pub estado: String,
    pub cantidad_total: f64,
    #[serde(rename = "items")]
    pub items: Vec<ExitItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ExitItemPayload {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    #[schema(value_type = Option<i64>)]
    #[validate(required(message = "El campo 'RelNumero' es obligatorio."))]
    pub rel_numero: Option<i64>,

    #[validate(
        required(message = "El campo 'ProdCodigo' es obligatorio."),
        length(min = 1, message = "El código de producto no puede estar vacío.")
    )]
    pub prod_codigo: Option<String>,

    pub nro_corte: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    #[schema(value_type = Option<i64>)]
    pub serie: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_f64")]
    #[schema(value_type = Option<f64>)]
    #[validate(
        required(message = "El campo 'Cantidad' es obligatorio."),
        custom(function = "validate_positive")
    )]
    pub cantidad: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateExitPayload {
    pub usuario_creacion: Option<String>,

    #[serde(rename = "items", alias = "productosSeleccionados", default)]
    #[validate(
        length(min = 1, message = "La salida debe tener al menos un ítem."),
        nested
    )]
    pub items: Vec<ExitItemPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_needs_items_with_positive_quantity() {
        let empty: CreateExitPayload = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(empty.validate().unwrap_err().errors().contains_key("items"));

        let zero: CreateExitPayload = serde_json::from_str(
            r#"{"productosSeleccionados": [{"RelNumero": "1", "ProdCodigo": "pr001", "Cantidad": 0}]}"#,
        )
        .unwrap();
        assert!(zero.validate().is_err());

        let ok: CreateExitPayload = serde_json::from_str(
            r#"{"items": [{"RelNumero": 1, "ProdCodigo": "pr001", "Cantidad": "2.5"}]}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.items[0].cantidad, Some(2.5));
    }
}
