// src/handlers/machines.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use validator::Validate;

use crate::{
    common::{
        error::{require, ApiError, AppError},
        json::ApiJson,
        sorting::{ListQuery, MAQUINA_SORT},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::machines::{CreateMachinePayload, Machine, UpdateMachinePayload},
};

// GET /api/maquina
#[utoipa::path(
    get,
    path = "/api/maquina",
    tag = "Máquinas",
    params(ListQuery),
    responses((status = 200, description = "Máquinas", body = Vec<Machine>))
)]
pub async fn list_machines(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let machines = app_state
        .machine_repo
        .find_all(&query.sort(&MAQUINA_SORT))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(machines)))
}

// GET /api/maquina/{maqCodigo}
#[utoipa::path(
    get,
    path = "/api/maquina/{maqCodigo}",
    tag = "Máquinas",
    params(("maqCodigo" = String, Path, description = "Código de máquina (mqNNN)")),
    responses(
        (status = 200, description = "Máquina", body = Machine),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(maq_codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let machine = app_state
        .machine_repo
        .find_by_code(&app_state.db_pool, &maq_codigo)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Máquina", &maq_codigo)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(machine)))
}

// POST /api/maquina
#[utoipa::path(
    post,
    path = "/api/maquina",
    tag = "Máquinas",
    request_body = CreateMachinePayload,
    responses((status = 201, description = "Máquina creada", body = Machine))
)]
pub async fn create_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateMachinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = async {
        let nombre = require(payload.maq_nombre.as_deref(), "MaqNombre")?;
        app_state
            .machine_repo
            .create(nombre, payload.usuario_creacion.as_deref(), Local::now().naive_local())
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("✅ Máquina {} creada", created.maq_codigo);
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/maquina/{maqCodigo}
#[utoipa::path(
    put,
    path = "/api/maquina/{maqCodigo}",
    tag = "Máquinas",
    params(("maqCodigo" = String, Path, description = "Código de máquina (mqNNN)")),
    request_body = UpdateMachinePayload,
    responses(
        (status = 200, description = "Máquina modificada", body = Machine),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(maq_codigo): Path<String>,
    ApiJson(payload): ApiJson<UpdateMachinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .machine_repo
        .update(
            &maq_codigo,
            payload.maq_nombre.as_deref(),
            payload.usuario_modificacion.as_deref(),
            Local::now().naive_local(),
        )
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Máquina", &maq_codigo)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/maquina/{maqCodigo}
#[utoipa::path(
    delete,
    path = "/api/maquina/{maqCodigo}",
    tag = "Máquinas",
    params(("maqCodigo" = String, Path, description = "Código de máquina (mqNNN)")),
    responses(
        (status = 204, description = "Máquina eliminada"),
        (status = 404, description = "No existe"),
        (status = 409, description = "Asociada a una relación silo-blend")
    )
)]
pub async fn delete_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(maq_codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state
        .machine_repo
        .delete(&maq_codigo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if deleted == 0 {
        return Err(AppError::not_found("Máquina", &maq_codigo).to_api_error(&locale, &app_state.i18n_store));
    }
    Ok(StatusCode::NO_CONTENT)
}
