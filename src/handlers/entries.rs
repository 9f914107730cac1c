// src/handlers/entries.rs

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
        sorting::{ListQuery, ENTRADA_SORT},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::entries::{
        AllocatedSerial, CorteExists, CreateEntryPayload, Entry, EntryDetail, EntryWithDetails, LatestQuery,
        OpenEntryStatus, SerialStatus, UpdateEntryPayload,
    },
};

// GET /api/entrada
#[utoipa::path(
    get,
    path = "/api/entrada",
    tag = "Entradas",
    params(ListQuery),
    responses((status = 200, description = "Cabeceras de entrada", body = Vec<Entry>))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .entry_service
        .list(&query.sort(&ENTRADA_SORT), query.estado())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

// POST /api/entrada
#[utoipa::path(
    post,
    path = "/api/entrada",
    tag = "Entradas",
    request_body = CreateEntryPayload,
    responses(
        (status = 201, description = "Entrada creada con su detalle y stock actualizado", body = EntryWithDetails),
        (status = 400, description = "Datos inválidos o entrada cerrada sin detalle"),
        (status = 404, description = "Producto inexistente"),
        (status = 409, description = "NroCorte repetido o ya hay una entrada abierta")
    )
)]
pub async fn create_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .entry_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/entrada/serie
#[utoipa::path(
    get,
    path = "/api/entrada/serie",
    tag = "Entradas",
    responses((status = 200, description = "Última serie asignada y la siguiente", body = SerialStatus))
)]
pub async fn get_serial_status(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .entry_service
        .serial_status()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(status)))
}

// POST /api/entrada/serie
#[utoipa::path(
    post,
    path = "/api/entrada/serie",
    tag = "Entradas",
    responses((status = 201, description = "Serie reservada", body = AllocatedSerial))
)]
pub async fn allocate_serial(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let serie = app_state
        .entry_service
        .allocate_serial()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(AllocatedSerial { serie })))
}

// GET /api/entrada/ultimas?limit=
#[utoipa::path(
    get,
    path = "/api/entrada/ultimas",
    tag = "Entradas",
    params(LatestQuery),
    responses((status = 200, description = "Últimas entradas por número", body = Vec<Entry>))
)]
pub async fn latest_entries(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<LatestQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .entry_service
        .latest(query.limit())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

// GET /api/entrada/abierta
#[utoipa::path(
    get,
    path = "/api/entrada/abierta",
    tag = "Entradas",
    responses((status = 200, description = "Entrada en estado Abierto, si existe", body = OpenEntryStatus))
)]
pub async fn get_open_entry(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .entry_service
        .open_entry()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(status)))
}

// GET /api/entrada/cortes
#[utoipa::path(
    get,
    path = "/api/entrada/cortes",
    tag = "Entradas",
    responses((status = 200, description = "NroCorte distintos registrados", body = Vec<String>))
)]
pub async fn list_cortes(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let cortes = app_state
        .entry_service
        .unique_cortes()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cortes)))
}

// GET /api/entrada/corte/{nroCorte}
#[utoipa::path(
    get,
    path = "/api/entrada/corte/{nroCorte}",
    tag = "Entradas",
    params(("nroCorte" = String, Path, description = "Número de corte")),
    responses((status = 200, description = "Si el corte ya fue usado", body = CorteExists))
)]
pub async fn check_corte(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(nro_corte): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let exists = app_state
        .entry_service
        .corte_exists(&nro_corte)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(exists)))
}

// GET /api/entrada/{entNumero}
#[utoipa::path(
    get,
    path = "/api/entrada/{entNumero}",
    tag = "Entradas",
    params(("entNumero" = i64, Path, description = "Número de entrada")),
    responses(
        (status = 200, description = "Entrada con su detalle", body = EntryWithDetails),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(ent_numero): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state
        .entry_service
        .get(ent_numero)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entry)))
}

// PUT /api/entrada/{entNumero}
#[utoipa::path(
    put,
    path = "/api/entrada/{entNumero}",
    tag = "Entradas",
    params(("entNumero" = i64, Path, description = "Número de entrada")),
    request_body = UpdateEntryPayload,
    responses(
        (status = 200, description = "Entrada modificada y stock reconciliado", body = EntryWithDetails),
        (status = 400, description = "Cierre sin detalle o stock insuficiente para revertir"),
        (status = 404, description = "No existe"),
        (status = 409, description = "NroCorte repetido o ya hay otra entrada abierta")
    )
)]
pub async fn update_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(ent_numero): Path<i64>,
    ApiJson(payload): ApiJson<UpdateEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .entry_service
        .update(ent_numero, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/entrada/{entNumero}
#[utoipa::path(
    delete,
    path = "/api/entrada/{entNumero}",
    tag = "Entradas",
    params(("entNumero" = i64, Path, description = "Número de entrada")),
    responses(
        (status = 204, description = "Entrada eliminada y stock revertido"),
        (status = 400, description = "El stock actual no alcanza para revertir"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(ent_numero): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .entry_service
        .delete(ent_numero)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/entrada/{entNumero}/detalle
#[utoipa::path(
    get,
    path = "/api/entrada/{entNumero}/detalle",
    tag = "Entradas",
    params(("entNumero" = i64, Path, description = "Número de entrada")),
    responses(
        (status = 200, description = "Líneas de la entrada", body = Vec<EntryDetail>),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_entry_details(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(ent_numero): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let details = app_state
        .entry_service
        .details(ent_numero)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(details)))
}

// DELETE /api/entrada/{entNumero}/detalle/{item}
#[utoipa::path(
    delete,
    path = "/api/entrada/{entNumero}/detalle/{item}",
    tag = "Entradas",
    params(
        ("entNumero" = i64, Path, description = "Número de entrada"),
        ("item" = i64, Path, description = "Ítem de la línea")
    ),
    responses(
        (status = 204, description = "Línea eliminada y stock revertido"),
        (status = 400, description = "Última línea de una entrada cerrada o stock insuficiente"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_entry_detail(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((ent_numero, item)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .entry_service
        .delete_detail(ent_numero, item)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
