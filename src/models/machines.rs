// src/models/machines.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct Machine {
    pub maq_codigo: String,
    pub maq_nombre: String,
    pub usuario_creacion: Option<String>,
    pub fecha_creacion: NaiveDateTime,
    pub usuario_modificacion: Option<String>,
    pub fecha_modificacion: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMachinePayload {
    #[validate(
        required(message = "El campo 'MaqNombre' es obligatorio."),
        length(min = 1, message = "El nombre no puede estar vacío.")
    )]
    pub maq_nombre: Option<String>,
    pub usuario_creacion: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateMachinePayload {
    #[validate(length(min = 1, message = "El nombre no puede estar vacío."))]
    pub maq_nombre: Option<String>,
    pub usuario_modificacion: Option<String>,
}
