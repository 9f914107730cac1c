// src/models/silos.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{common::lenient, models::RecordState};

// --- Silos ---
// La IP es solo metadato asociado, no se usa para controlar el silo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct Silo {
    pub silo_codigo: String,
    pub silo_nombre: String,
    #[serde(rename = "DireccionIP")]
    #[sqlx(rename = "DireccionIP")]
    pub direccion_ip: Option<String>,
    pub silo_estado: RecordState,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSiloPayload {
    #[validate(
        required(message = "El campo 'SiloNombre' es obligatorio."),
        length(min = 1, message = "El nombre no puede estar vacío.")
    )]
    pub silo_nombre: Option<String>,

    #[serde(rename = "DireccionIP")]
    #[validate(ip(message = "La dirección IP no es válida."))]
    pub direccion_ip: Option<String>,

    pub silo_estado: Option<RecordState>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateSiloPayload {
    #[validate(length(min = 1, message = "El nombre no puede estar vacío."))]
    pub silo_nombre: Option<String>,

    #[serde(rename = "DireccionIP")]
    #[validate(ip(message = "La dirección IP no es válida."))]
    pub direccion_ip: Option<String>,

    pub silo_estado: Option<RecordState>,
}

// --- Relación Silo-Blend ---
// Cabecera: qué producto (blend) y corte está cargado en qué silo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct SiloBlend {
    pub rel_numero: i64,
    pub prod_codigo: String,
    pub prod_nombre: Option<String>,
    pub silo_codigo: String,
    pub silo_nombre: Option<String>,
    pub nro_corte: Option<String>,
    pub estado: RecordState,
}

// Detalle: máquinas asociadas a la relación, clave (RelNumero, Item).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct SiloBlendMachine {
    pub rel_numero: i64,
    pub item: i64,
    pub maq_codigo: String,
    pub maq_nombre: Option<String>,
    pub estado: RecordState,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SiloBlendWithMachines {
    #[serde(flatten)]
    pub relacion: SiloBlend,
    pub maquinas: Vec<SiloBlendMachine>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSiloBlendPayload {
    #[validate(required(message = "El campo 'ProdCodigo' es obligatorio."))]
    pub prod_codigo: Option<String>,

    #[validate(required(message = "El campo 'SiloCodigo' es obligatorio."))]
    pub silo_codigo: Option<String>,

    pub nro_corte: Option<String>,
    pub estado: Option<RecordState>,

    /// Códigos de máquina a asociar (Item 1..n en este orden).
    #[serde(rename = "maquinas", default)]
    pub maquinas: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateSiloBlendPayload {
    pub prod_codigo: Option<String>,
    pub silo_codigo: Option<String>,
    pub nro_corte: Option<String>,
    pub estado: Option<RecordState>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct AddSiloBlendMachinePayload {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    #[validate(required(message = "El campo 'RelNumero' es obligatorio."))]
    pub rel_numero: Option<i64>,

    #[validate(
        required(message = "El campo 'MaqCodigo' es obligatorio."),
        length(min = 1, message = "El código de máquina no puede estar vacío.")
    )]
    pub maq_codigo: Option<String>,

    pub estado: Option<RecordState>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateSiloBlendMachinePayload {
    #[validate(required(message = "El campo 'Estado' es obligatorio."))]
    pub estado: Option<RecordState>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SiloBlendMachineQuery {
    /// Número de relación cuyas máquinas se listan.
    pub rel_numero: i64,
}
