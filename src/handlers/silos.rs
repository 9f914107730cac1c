// src/handlers/silos.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{require, ApiError, AppError},
        json::ApiJson,
        sorting::{ListQuery, REL_SILO_SORT, SILO_SORT},
    },
    config::AppState,
    db::silo_blend_repo::NewSiloBlend,
    middleware::i18n::Locale,
    models::silos::{
        AddSiloBlendMachinePayload, CreateSiloBlendPayload, CreateSiloPayload, Silo, SiloBlend,
        SiloBlendMachine, SiloBlendMachineQuery, SiloBlendWithMachines, UpdateSiloBlendMachinePayload,
        UpdateSiloBlendPayload, UpdateSiloPayload,
    },
};

// ---
// Silos
// ---

// GET /api/silo
#[utoipa::path(
    get,
    path = "/api/silo",
    tag = "Silos",
    params(ListQuery),
    responses((status = 200, description = "Silos", body = Vec<Silo>))
)]
pub async fn list_silos(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let silos = app_state
        .silo_repo
        .find_all(&query.sort(&SILO_SORT), query.estado())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(silos)))
}

// GET /api/silo/{siloCodigo}
#[utoipa::path(
    get,
    path = "/api/silo/{siloCodigo}",
    tag = "Silos",
    params(("siloCodigo" = String, Path, description = "Código de silo (siNNN)")),
    responses(
        (status = 200, description = "Silo", body = Silo),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_silo(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(silo_codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let silo = app_state
        .silo_repo
        .find_by_code(&app_state.db_pool, &silo_codigo)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Silo", &silo_codigo)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(silo)))
}

// POST /api/silo
#[utoipa::path(
    post,
    path = "/api/silo",
    tag = "Silos",
    request_body = CreateSiloPayload,
    responses(
        (status = 201, description = "Silo creado", body = Silo),
        (status = 400, description = "Nombre faltante o IP inválida")
    )
)]
pub async fn create_silo(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateSiloPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = async {
        let nombre = require(payload.silo_nombre.as_deref(), "SiloNombre")?;
        app_state
            .silo_repo
            .create(nombre, payload.direccion_ip.as_deref(), payload.silo_estado.unwrap_or_default())
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("✅ Silo {} creado", created.silo_codigo);
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/silo/{siloCodigo}
#[utoipa::path(
    put,
    path = "/api/silo/{siloCodigo}",
    tag = "Silos",
    params(("siloCodigo" = String, Path, description = "Código de silo (siNNN)")),
    request_body = UpdateSiloPayload,
    responses(
        (status = 200, description = "Silo modificado", body = Silo),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_silo(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(silo_codigo): Path<String>,
    ApiJson(payload): ApiJson<UpdateSiloPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .silo_repo
        .update(&silo_codigo, &payload)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Silo", &silo_codigo)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/silo/{siloCodigo}
#[utoipa::path(
    delete,
    path = "/api/silo/{siloCodigo}",
    tag = "Silos",
    params(("siloCodigo" = String, Path, description = "Código de silo (siNNN)")),
    responses(
        (status = 204, description = "Silo eliminado"),
        (status = 404, description = "No existe"),
        (status = 409, description = "Usado por una relación silo-blend")
    )
)]
pub async fn delete_silo(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(silo_codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state
        .silo_repo
        .delete(&silo_codigo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if deleted == 0 {
        return Err(AppError::not_found("Silo", &silo_codigo).to_api_error(&locale, &app_state.i18n_store));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Relación silo-blend (cabecera)
// ---

// GET /api/relsilo
#[utoipa::path(
    get,
    path = "/api/relsilo",
    tag = "Silos",
    params(ListQuery),
    responses((status = 200, description = "Relaciones silo-blend", body = Vec<SiloBlend>))
)]
pub async fn list_silo_blends(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let blends = app_state
        .silo_blend_repo
        .find_all(&query.sort(&REL_SILO_SORT), query.estado())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(blends)))
}

// GET /api/relsilo/{relNumero}
#[utoipa::path(
    get,
    path = "/api/relsilo/{relNumero}",
    tag = "Silos",
    params(("relNumero" = i64, Path, description = "Número de relación")),
    responses(
        (status = 200, description = "Relación con sus máquinas", body = SiloBlendWithMachines),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_silo_blend(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(rel_numero): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let blend = app_state
        .silo_blend_repo
        .find_with_machines(rel_numero)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Relación silo-blend", rel_numero)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(blend)))
}

// POST /api/relsilo
#[utoipa::path(
    post,
    path = "/api/relsilo",
    tag = "Silos",
    request_body = CreateSiloBlendPayload,
    responses(
        (status = 201, description = "Relación creada", body = SiloBlendWithMachines),
        (status = 404, description = "Producto, silo o máquina inexistente")
    )
)]
pub async fn create_silo_blend(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateSiloBlendPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = async {
        let new = NewSiloBlend {
            prod_codigo: require(payload.prod_codigo.as_deref(), "ProdCodigo")?,
            silo_codigo: require(payload.silo_codigo.as_deref(), "SiloCodigo")?,
            nro_corte: payload.nro_corte.as_deref(),
            estado: payload.estado.unwrap_or_default(),
            maquinas: &payload.maquinas,
        };
        app_state.silo_blend_repo.create(new).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!(
        "✅ Relación {} creada ({} en {}, {} máquinas)",
        created.relacion.rel_numero,
        created.relacion.prod_codigo,
        created.relacion.silo_codigo,
        created.maquinas.len()
    );
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/relsilo/{relNumero}
#[utoipa::path(
    put,
    path = "/api/relsilo/{relNumero}",
    tag = "Silos",
    params(("relNumero" = i64, Path, description = "Número de relación")),
    request_body = UpdateSiloBlendPayload,
    responses(
        (status = 200, description = "Relación modificada", body = SiloBlend),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_silo_blend(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(rel_numero): Path<i64>,
    ApiJson(payload): ApiJson<UpdateSiloBlendPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .silo_blend_repo
        .update(rel_numero, &payload)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Relación silo-blend", rel_numero)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/relsilo/{relNumero}
#[utoipa::path(
    delete,
    path = "/api/relsilo/{relNumero}",
    tag = "Silos",
    params(("relNumero" = i64, Path, description = "Número de relación")),
    responses(
        (status = 204, description = "Relación y detalle eliminados"),
        (status = 404, description = "No existe"),
        (status = 409, description = "Referenciada por salidas")
    )
)]
pub async fn delete_silo_blend(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(rel_numero): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state
        .silo_blend_repo
        .delete(rel_numero)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if deleted == 0 {
        return Err(AppError::not_found("Relación silo-blend", rel_numero).to_api_error(&locale, &app_state.i18n_store));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Relación silo-blend (máquinas)
// ---

// GET /api/relsiloblend2?relNumero=
#[utoipa::path(
    get,
    path = "/api/relsiloblend2",
    tag = "Silos",
    params(SiloBlendMachineQuery),
    responses((status = 200, description = "Máquinas de la relación", body = Vec<SiloBlendMachine>))
)]
pub async fn list_silo_blend_machines(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<SiloBlendMachineQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let machines = app_state
        .silo_blend_repo
        .find_machines(&app_state.db_pool, query.rel_numero)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(machines)))
}

// POST /api/relsiloblend2
#[utoipa::path(
    post,
    path = "/api/relsiloblend2",
    tag = "Silos",
    request_body = AddSiloBlendMachinePayload,
    responses(
        (status = 201, description = "Máquina agregada a la relación", body = SiloBlendMachine),
        (status = 404, description = "Relación o máquina inexistente")
    )
)]
pub async fn add_silo_blend_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<AddSiloBlendMachinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = async {
        let rel_numero = require(payload.rel_numero, "RelNumero")?;
        let maq_codigo = require(payload.maq_codigo.as_deref(), "MaqCodigo")?;
        app_state
            .silo_blend_repo
            .add_machine(rel_numero, maq_codigo, payload.estado.unwrap_or_default())
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/relsiloblend2/{relNumero}/{item}
#[utoipa::path(
    put,
    path = "/api/relsiloblend2/{relNumero}/{item}",
    tag = "Silos",
    params(
        ("relNumero" = i64, Path, description = "Número de relación"),
        ("item" = i64, Path, description = "Ítem dentro de la relación")
    ),
    request_body = UpdateSiloBlendMachinePayload,
    responses(
        (status = 200, description = "Estado actualizado", body = SiloBlendMachine),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_silo_blend_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((rel_numero, item)): Path<(i64, i64)>,
    ApiJson(payload): ApiJson<UpdateSiloBlendMachinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = async {
        let estado = require(payload.estado, "Estado")?;
        app_state
            .silo_blend_repo
            .update_machine_state(rel_numero, item, estado)
            .await?
            .ok_or_else(|| AppError::not_found("Máquina de la relación", format!("{rel_numero}/{item}")))
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/relsiloblend2/{relNumero}/{item}
#[utoipa::path(
    delete,
    path = "/api/relsiloblend2/{relNumero}/{item}",
    tag = "Silos",
    params(
        ("relNumero" = i64, Path, description = "Número de relación"),
        ("item" = i64, Path, description = "Ítem dentro de la relación")
    ),
    responses(
        (status = 204, description = "Máquina quitada de la relación"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_silo_blend_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((rel_numero, item)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state
        .silo_blend_repo
        .delete_machine(rel_numero, item)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if deleted == 0 {
        let key = format!("{rel_numero}/{item}");
        return Err(AppError::not_found("Máquina de la relación", key).to_api_error(&locale, &app_state.i18n_store));
    }
    Ok(StatusCode::NO_CONTENT)
}
