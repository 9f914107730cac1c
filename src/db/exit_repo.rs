// src/db/exit_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{common::error::AppError, models::exits::ExitRow};

// Las filas salen siempre ordenadas por (SalNumero, Item); el agrupado depende de eso.
const ROW_SELECT: &str = r#"
    SELECT s.SalNumero, s.Item, s.RelNumero, s.ProdCodigo, p.ProdNombre, s.NroCorte, s.Serie,
           s.Cantidad, s.UsuarioCreacion, s.FechaCreacion, s.Estado
    FROM Salida s
    LEFT JOIN Producto p ON p.ProdCodigo = s.ProdCodigo
"#;

pub struct NewExitRow<'a> {
    pub sal_numero: i64,
    pub item: i64,
    pub rel_numero: i64,
    pub prod_codigo: &'a str,
    pub nro_corte: Option<&'a str>,
    pub serie: Option<i64>,
    pub cantidad: f64,
    pub usuario_creacion: Option<&'a str>,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone)]
pub struct ExitRepository {
    pool: SqlitePool,
}

impl ExitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn next_number<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(SalNumero), 0) + 1 FROM Salida")
            .fetch_one(executor)
            .await?;
        Ok(next)
    }

    pub async fn insert_row<'e, E>(&self, executor: E, row: &NewExitRow<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO Salida
                (SalNumero, Item, RelNumero, ProdCodigo, NroCorte, Serie, Cantidad, UsuarioCreacion, FechaCreacion, Estado)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'Activo')
            "#,
        )
        .bind(row.sal_numero)
        .bind(row.item)
        .bind(row.rel_numero)
        .bind(row.prod_codigo)
        .bind(row.nro_corte)
        .bind(row.serie)
        .bind(row.cantidad)
        .bind(row.usuario_creacion)
        .bind(row.fecha_creacion)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_rows(&self, estado: Option<&str>) -> Result<Vec<ExitRow>, AppError> {
        let sql = format!("{ROW_SELECT} WHERE (?1 IS NULL OR s.Estado = ?1) ORDER BY s.SalNumero, s.Item");
        let rows = sqlx::query_as::<_, ExitRow>(&sql)
            .bind(estado)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_rows_by_number<'e, E>(&self, executor: E, sal_numero: i64) -> Result<Vec<ExitRow>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{ROW_SELECT} WHERE s.SalNumero = ? ORDER BY s.Item");
        let rows = sqlx::query_as::<_, ExitRow>(&sql)
            .bind(sal_numero)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}
