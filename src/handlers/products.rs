// src/handlers/products.rs

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
        sorting::{ListQuery, PRODUCTO_SORT, TIPO_PRODUCTO_SORT},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::products::{CreateProductPayload, Product, ProductType, ProductTypePayload, UpdateProductPayload},
};

// ---
// Tipos de producto
// ---

// GET /api/tipoproducto
#[utoipa::path(
    get,
    path = "/api/tipoproducto",
    tag = "Productos",
    params(ListQuery),
    responses((status = 200, description = "Tipos de producto", body = Vec<ProductType>))
)]
pub async fn list_product_types(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let types = app_state
        .product_repo
        .find_all_types(&query.sort(&TIPO_PRODUCTO_SORT))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(types)))
}

// GET /api/tipoproducto/{tipoCodigo}
#[utoipa::path(
    get,
    path = "/api/tipoproducto/{tipoCodigo}",
    tag = "Productos",
    params(("tipoCodigo" = i64, Path, description = "Código del tipo")),
    responses(
        (status = 200, description = "Tipo de producto", body = ProductType),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_product_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(tipo_codigo): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product_type = app_state
        .product_repo
        .find_type(&app_state.db_pool, tipo_codigo)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Tipo de producto", tipo_codigo)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product_type)))
}

// POST /api/tipoproducto
#[utoipa::path(
    post,
    path = "/api/tipoproducto",
    tag = "Productos",
    request_body = ProductTypePayload,
    responses(
        (status = 201, description = "Tipo creado", body = ProductType),
        (status = 409, description = "Nombre repetido")
    )
)]
pub async fn create_product_type(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<ProductTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = async {
        let nombre = require(payload.tipo_nombre.as_deref(), "TipoNombre")?;
        app_state.product_repo.create_type(nombre).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/tipoproducto/{tipoCodigo}
#[utoipa::path(
    put,
    path = "/api/tipoproducto/{tipoCodigo}",
    tag = "Productos",
    params(("tipoCodigo" = i64, Path, description = "Código del tipo")),
    request_body = ProductTypePayload,
    responses(
        (status = 200, description = "Tipo modificado", body = ProductType),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_product_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(tipo_codigo): Path<i64>,
    ApiJson(payload): ApiJson<ProductTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = async {
        let nombre = require(payload.tipo_nombre.as_deref(), "TipoNombre")?;
        app_state
            .product_repo
            .update_type(tipo_codigo, nombre)
            .await?
            .ok_or_else(|| AppError::not_found("Tipo de producto", tipo_codigo))
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/tipoproducto/{tipoCodigo}
#[utoipa::path(
    delete,
    path = "/api/tipoproducto/{tipoCodigo}",
    tag = "Productos",
    params(("tipoCodigo" = i64, Path, description = "Código del tipo")),
    responses(
        (status = 204, description = "Tipo eliminado"),
        (status = 404, description = "No existe"),
        (status = 409, description = "Tiene productos asociados")
    )
)]
pub async fn delete_product_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(tipo_codigo): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state
        .product_repo
        .delete_type(tipo_codigo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if deleted == 0 {
        return Err(AppError::not_found("Tipo de producto", tipo_codigo).to_api_error(&locale, &app_state.i18n_store));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Productos
// ---

// GET /api/producto
#[utoipa::path(
    get,
    path = "/api/producto",
    tag = "Productos",
    params(ListQuery),
    responses((status = 200, description = "Productos con su stock", body = Vec<Product>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_repo
        .find_all(&query.sort(&PRODUCTO_SORT), query.estado())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// GET /api/producto/{prodCodigo}
#[utoipa::path(
    get,
    path = "/api/producto/{prodCodigo}",
    tag = "Productos",
    params(("prodCodigo" = String, Path, description = "Código de producto (prNNN)")),
    responses(
        (status = 200, description = "Producto", body = Product),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(prod_codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_repo
        .find_by_code(&app_state.db_pool, &prod_codigo)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Producto", &prod_codigo)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// POST /api/producto
#[utoipa::path(
    post,
    path = "/api/producto",
    tag = "Productos",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Producto creado con stock 0", body = Product),
        (status = 404, description = "El tipo no existe")
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = async {
        let tipo_codigo = require(payload.tipo_codigo, "TipoCodigo")?;
        let nombre = require(payload.prod_nombre.as_deref(), "ProdNombre")?;
        app_state
            .product_repo
            .create(
                tipo_codigo,
                nombre,
                payload.prod_estado.unwrap_or_default(),
                payload.horas_cura.unwrap_or(0),
            )
            .await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("✅ Producto {} creado", created.prod_codigo);
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/producto/{prodCodigo}
#[utoipa::path(
    put,
    path = "/api/producto/{prodCodigo}",
    tag = "Productos",
    params(("prodCodigo" = String, Path, description = "Código de producto (prNNN)")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Producto modificado", body = Product),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(prod_codigo): Path<String>,
    ApiJson(payload): ApiJson<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .product_repo
        .update(&prod_codigo, &payload)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::not_found("Producto", &prod_codigo)))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}

// DELETE /api/producto/{prodCodigo}
#[utoipa::path(
    delete,
    path = "/api/producto/{prodCodigo}",
    tag = "Productos",
    params(("prodCodigo" = String, Path, description = "Código de producto (prNNN)")),
    responses(
        (status = 204, description = "Producto eliminado"),
        (status = 404, description = "No existe"),
        (status = 409, description = "Tiene movimientos o relaciones")
    )
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(prod_codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state
        .product_repo
        .delete(&prod_codigo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if deleted == 0 {
        return Err(AppError::not_found("Producto", &prod_codigo).to_api_error(&locale, &app_state.i18n_store));
    }
    tracing::info!("🗑️ Producto {} eliminado", prod_codigo);
    Ok(StatusCode::NO_CONTENT)
}
