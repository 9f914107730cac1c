// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::dashboard::{DashboardQuery, DashboardSummary, MovementDay, StockEntry},
};

// GET /api/dashboard/resumen
#[utoipa::path(
    get,
    path = "/api/dashboard/resumen",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Indicadores de planta del día", body = DashboardSummary)
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_summary()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/stock
#[utoipa::path(
    get,
    path = "/api/dashboard/stock",
    tag = "Dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Productos con más stock", body = Vec<StockEntry>)
    )
)]
pub async fn get_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let stock = app_state
        .dashboard_service
        .get_stock(query.limit())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stock)))
}

// GET /api/dashboard/movimientos
#[utoipa::path(
    get,
    path = "/api/dashboard/movimientos",
    tag = "Dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Cantidades ingresadas y egresadas por día", body = Vec<MovementDay>)
    )
)]
pub async fn get_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .dashboard_service
        .get_movements(query.dias())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}
