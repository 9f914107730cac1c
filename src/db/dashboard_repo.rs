// src/db/dashboard_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::error::AppError,
    models::dashboard::{DashboardSummary, StockEntry},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // 1. Resumen general
    // `day_start`/`day_end` delimitan "hoy"; `now` decide qué entradas siguen en cura.
    pub async fn get_summary(
        &self,
        day_start: NaiveDateTime,
        day_end: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<DashboardSummary, AppError> {
        // Una transacción de lectura para que todas las tarjetas vean la misma foto
        let mut tx = self.pool.begin().await?;

        // A. Productos y stock
        let (total_productos, productos_activos, stock_total): (i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN ProdEstado = 'Activo' THEN 1 ELSE 0 END), 0),
                   CAST(COALESCE(SUM(Stock), 0.0) AS REAL)
            FROM Producto
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        // B. Silos y máquinas
        let silos_activos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Silo WHERE SiloEstado = 'Activo'")
            .fetch_one(&mut *tx)
            .await?;
        let total_maquinas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Maquina")
            .fetch_one(&mut *tx)
            .await?;

        // C. Entrada abierta
        let entrada_abierta: Option<i64> =
            sqlx::query_scalar("SELECT EntNumero FROM Entrada WHERE Estado = 'Abierto' LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        // D. Movimientos de hoy
        let entradas_hoy: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM Entrada WHERE FechaCreacion >= ? AND FechaCreacion < ?")
                .bind(day_start)
                .bind(day_end)
                .fetch_one(&mut *tx)
                .await?;
        let cantidad_ingresada_hoy: f64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(Cantidad), 0.0) AS REAL) FROM EntradaDetalle WHERE Fecha >= ? AND Fecha < ?",
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&mut *tx)
        .await?;
        let (salidas_hoy, cantidad_egresada_hoy): (i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT SalNumero), CAST(COALESCE(SUM(Cantidad), 0.0) AS REAL)
            FROM Salida
            WHERE FechaCreacion >= ? AND FechaCreacion < ?
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&mut *tx)
        .await?;

        // E. Entradas todavía en cura
        let entradas_en_cura: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM Entrada WHERE FechaCura > ? AND Estado <> 'Anulado'")
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            total_productos,
            productos_activos,
            stock_total,
            silos_activos,
            total_maquinas,
            entrada_abierta,
            entradas_hoy,
            cantidad_ingresada_hoy,
            salidas_hoy,
            cantidad_egresada_hoy,
            entradas_en_cura,
        })
    }

    // 2. Stock por producto (mayor primero)
    pub async fn get_top_stock<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<StockEntry>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let data = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT ProdCodigo, ProdNombre, Stock
            FROM Producto
            ORDER BY Stock DESC, ProdCodigo ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(data)
    }

    // 3. Totales diarios desde `since`: (YYYY-MM-DD, entradas) y (YYYY-MM-DD, salidas)
    pub async fn get_daily_movements(
        &self,
        since: NaiveDateTime,
    ) -> Result<(Vec<(String, f64)>, Vec<(String, f64)>), AppError> {
        let mut tx = self.pool.begin().await?;

        let entradas: Vec<(String, f64)> = sqlx::query_as(
            r#"
            SELECT SUBSTR(Fecha, 1, 10) AS Dia, CAST(SUM(Cantidad) AS REAL)
            FROM EntradaDetalle
            WHERE Fecha >= ?
            GROUP BY Dia
            ORDER BY Dia
            "#,
        )
        .bind(since)
        .fetch_all(&mut *tx)
        .await?;

        let salidas: Vec<(String, f64)> = sqlx::query_as(
            r#"
            SELECT SUBSTR(FechaCreacion, 1, 10) AS Dia, CAST(SUM(Cantidad) AS REAL)
            FROM Salida
            WHERE FechaCreacion >= ?
            GROUP BY Dia
            ORDER BY Dia
            "#,
        )
        .bind(since)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((entradas, salidas))
    }
}
