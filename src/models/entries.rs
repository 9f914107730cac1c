// src/models/entries.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::{lenient, quantity::round_qty};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
pub enum EntryState {
    #[serde(rename = "Abierto")]
    #[sqlx(rename = "Abierto")]
    Open,
    #[serde(rename = "Cerrado")]
    #[sqlx(rename = "Cerrado")]
    Closed,
    #[serde(rename = "Anulado")]
    #[sqlx(rename = "Anulado")]
    Voided,
}

impl EntryState {
    /// Una entrada anulada no aporta su detalle al stock.
    pub fn counts_stock(self) -> bool {
        self != EntryState::Voided
    }
}

// --- Cabecera de Entrada ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct Entry {
    pub ent_numero: i64,
    pub fecha: NaiveDate,
    pub nro_corte: String,
    pub estado: EntryState,
    pub comentario: Option<String>,
    pub usuario_creacion: Option<String>,
    pub fecha_creacion: NaiveDateTime,
    pub prod_codigo: String,
    pub prod_nombre: Option<String>,
    /// FechaCreacion + HorasCura del producto principal.
    pub fecha_cura: NaiveDateTime,
}

// --- Detalle de Entrada ---
// Cada línea lleva una Serie única a nivel de todo el sistema.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct EntryDetail {
    pub ent_numero: i64,
    pub item: i64,
    pub prod_codigo: String,
    pub prod_nombre: Option<String>,
    pub serie: i64,
    pub cantidad: f64,
    pub fecha: NaiveDateTime,
    pub fecha_cura: NaiveDateTime,
    pub estado: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntryWithDetails {
    #[serde(flatten)]
    pub entrada: Entry,
    pub detalle: Vec<EntryDetail>,
}

// Lo que redondea a 0 con 3 decimales tampoco es una cantidad válida.
pub(crate) fn validate_positive(val: f64) -> Result<(), ValidationError> {
    if !val.is_finite() || round_qty(val) <= 0.0 {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("La cantidad debe ser mayor a cero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---

/// Línea de detalle enviada por el formulario.
///
/// `Serie` es opcional. Se conserva si ya fue emitida por el contador (reservada
/// con `POST /api/entrada/serie` o propia de la entrada) y ninguna otra línea la usa;
/// si no, el servidor asigna una nueva.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct EntryLinePayload {
    #[validate(
        required(message = "El campo 'ProdCodigo' es obligatorio."),
        length(min = 1, message = "El código de producto no puede estar vacío.")
    )]
    pub prod_codigo: Option<String>,

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

    pub estado: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEntryPayload {
    #[validate(required(message = "El campo 'Fecha' es obligatorio."))]
    pub fecha: Option<NaiveDate>,

    #[validate(
        required(message = "El campo 'NroCorte' es obligatorio."),
        length(min = 1, message = "El NroCorte no puede estar vacío.")
    )]
    pub nro_corte: Option<String>,

    #[validate(
        required(message = "El campo 'ProdCodigo' es obligatorio."),
        length(min = 1, message = "El código de producto no puede estar vacío.")
    )]
    pub prod_codigo: Option<String>,

    pub estado: Option<EntryState>,
    pub comentario: Option<String>,
    pub usuario_creacion: Option<String>,

    #[serde(rename = "productosSeleccionados", default)]
    #[validate(nested)]
    pub productos_seleccionados: Vec<EntryLinePayload>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateEntryPayload {
    pub fecha: Option<NaiveDate>,

    #[validate(length(min = 1, message = "El NroCorte no puede estar vacío."))]
    pub nro_corte: Option<String>,

    pub estado: Option<EntryState>,
    pub comentario: Option<String>,

    #[validate(length(min = 1, message = "El código de producto no puede estar vacío."))]
    pub prod_codigo: Option<String>,

    /// Si viene, reemplaza el detalle completo de la entrada.
    #[serde(rename = "productosSeleccionados")]
    #[validate(nested)]
    pub productos_seleccionados: Option<Vec<EntryLinePayload>>,
}

impl UpdateEntryPayload {
    pub fn has_header_changes(&self) -> bool {
        self.fecha.is_some()
            || self.nro_corte.is_some()
            || self.estado.is_some()
            || self.comentario.is_some()
            || self.prod_codigo.is_some()
    }
}

// ---
// Respuestas auxiliares
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct OpenEntryStatus {
    pub abierta: bool,
    pub entrada: Option<Entry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CorteExists {
    pub existe: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerialStatus {
    pub ultima_serie: i64,
    pub siguiente_serie: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllocatedSerial {
    pub serie: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestQuery {
    /// Cantidad de entradas (por defecto 10, máximo 100).
    pub limit: Option<i64>,
}

impl LatestQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_payload_with_text_serial_deserializes() {
        let payload: CreateEntryPayload = serde_json::from_str(
            r#"{
                "Fecha": "2024-01-01",
                "NroCorte": "C-100",
                "ProdCodigo": "pr001",
                "productosSeleccionados": [
                    {"ProdCodigo": "pr001", "Serie": "1", "Cantidad": 50, "Peso": "ignorado"}
                ]
            }"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.productos_seleccionados[0].serie, Some(1));
        assert_eq!(payload.productos_seleccionados[0].cantidad, Some(50.0));
    }

    #[test]
    fn missing_corte_and_zero_quantity_fail_validation() {
        let payload: CreateEntryPayload = serde_json::from_str(
            r#"{
                "Fecha": "2024-01-01",
                "ProdCodigo": "pr001",
                "productosSeleccionados": [{"ProdCodigo": "pr001", "Cantidad": 0}]
            }"#,
        )
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("nro_corte"));
        assert!(fields.contains_key("productos_seleccionados"));
    }

    #[test]
    fn quantity_below_the_third_decimal_is_rejected() {
        assert!(validate_positive(0.001).is_ok());
        assert!(validate_positive(0.0004).is_err());
        assert!(validate_positive(f64::NAN).is_err());
        assert!(validate_positive(-1.0).is_err());
    }

    #[test]
    fn state_uses_spanish_names() {
        assert_eq!(serde_json::to_string(&EntryState::Closed).unwrap(), "\"Cerrado\"");
        let state: EntryState = serde_json::from_str("\"Anulado\"").unwrap();
        assert_eq!(state, EntryState::Voided);
    }

    #[test]
    fn latest_limit_is_clamped() {
        assert_eq!(LatestQuery { limit: None }.limit(), 10);
        assert_eq!(LatestQuery { limit: Some(1000) }.limit(), 100);
        assert_eq!(LatestQuery { limit: Some(0) }.limit(), 1);
    }
}
