// src/handlers/exits.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        json::ApiJson,
        sorting::{ListQuery, SALIDA_SORT},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::exits::{CreateExitPayload, Exit},
};

// GET /api/salida
#[utoipa::path(
    get,
    path = "/api/salida",
    tag = "Salidas",
    params(ListQuery),
    responses((status = 200, description = "Salidas agrupadas por número", body = Vec<Exit>))
)]
pub async fn list_exits(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let exits = app_state
        .exit_service
        .list(&query.sort(&SALIDA_SORT), query.estado())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(exits)))
}

// GET /api/salida/{salNumero}
#[utoipa::path(
    get,
    path = "/api/salida/{salNumero}",
    tag = "Salidas",
    params(("salNumero" = i64, Path, description = "Número de salida")),
    responses(
        (status = 200, description = "Salida con sus ítems", body = Exit),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_exit(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(sal_numero): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let exit = app_state
        .exit_service
        .get(sal_numero)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(exit)))
}

// POST /api/salida
#[utoipa::path(
    post,
    path = "/api/salida",
    tag = "Salidas",
    request_body = CreateExitPayload,
    responses(
        (status = 201, description = "Salida registrada y stock descontado", body = Exit),
        (status = 400, description = "Datos inválidos o stock insuficiente"),
        (status = 404, description = "Producto o relación silo-blend inexistente")
    )
)]
pub async fn create_exit(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateExitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .exit_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}
