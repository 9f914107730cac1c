// src/models/products.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::RecordState;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct ProductType {
    pub tipo_codigo: i64,
    pub tipo_nombre: String,
}

// Producto del catálogo. El Stock solo lo modifican Entradas y Salidas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct Product {
    pub prod_codigo: String,
    pub tipo_codigo: i64,
    /// Nombre del tipo (join con TipoProducto).
    pub tipo_nombre: Option<String>,
    pub prod_nombre: String,
    pub prod_estado: RecordState,
    pub stock: f64,
    /// Horas de cura que se suman a la fecha de ingreso.
    pub horas_cura: i64,
}

pub(crate) fn validate_not_negative(val: i64) -> Result<(), ValidationError> {
    if val < 0 {
        let mut err = ValidationError::new("range");
        err.message = Some("El valor no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ProductTypePayload {
    #[validate(
        required(message = "El campo 'TipoNombre' es obligatorio."),
        length(min = 1, message = "El nombre no puede estar vacío.")
    )]
    pub tipo_nombre: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProductPayload {
    #[validate(required(message = "El campo 'TipoCodigo' es obligatorio."))]
    pub tipo_codigo: Option<i64>,

    #[validate(
        required(message = "El campo 'ProdNombre' es obligatorio."),
        length(min = 1, message = "El nombre no puede estar vacío.")
    )]
    pub prod_nombre: Option<String>,

    pub prod_estado: Option<RecordState>,

    #[validate(custom(function = "validate_not_negative"))]
    pub horas_cura: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateProductPayload {
    pub tipo_codigo: Option<i64>,

    #[validate(length(min = 1, message = "El nombre no puede estar vacío."))]
    pub prod_nombre: Option<String>,

    pub prod_estado: Option<RecordState>,

    #[validate(custom(function = "validate_not_negative"))]
    pub horas_cura: Option<i64>,
}
