// src/models/dashboard.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

// 1. Resumen (las tarjetas del tablero)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_productos: i64,
    pub productos_activos: i64,
    pub stock_total: f64,
    pub silos_activos: i64,
    pub total_maquinas: i64,
    pub entrada_abierta: Option<i64>, // N° de la entrada en estado Abierto, si hay
    pub entradas_hoy: i64,
    pub cantidad_ingresada_hoy: f64,
    pub salidas_hoy: i64,
    pub cantidad_egresada_hoy: f64,
    pub entradas_en_cura: i64, // FechaCura todavía en el futuro
}

// 2. Stock por producto
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct StockEntry {
    pub prod_codigo: String,
    pub prod_nombre: String,
    pub stock: f64,
}

// 3. Movimientos diarios (entradas vs salidas)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementDay {
    pub fecha: String, // YYYY-MM-DD
    pub entradas: f64,
    pub salidas: f64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Límite de productos para /stock (por defecto 10, máximo 100).
    pub limit: Option<i64>,
    /// Días hacia atrás para /movimientos (por defecto 7, máximo 90).
    pub dias: Option<i64>,
}

impl DashboardQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn dias(&self) -> i64 {
        self.dias.unwrap_or(7).clamp(1, 90)
    }
}
