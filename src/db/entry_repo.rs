// src/db/entry_repo.rs

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{
        db_utils::{is_unique_violation, is_unique_violation_on},
        error::AppError,
        sorting::SortSpec,
    },
    models::entries::{Entry, EntryDetail, EntryState},
};

const ENTRY_SELECT: &str = r#"
    SELECT e.EntNumero, e.Fecha, e.NroCorte, e.Estado, e.Comentario, e.UsuarioCreacion,
           e.FechaCreacion, e.ProdCodigo, p.ProdNombre, e.FechaCura
    FROM Entrada e
    LEFT JOIN Producto p ON p.ProdCodigo = e.ProdCodigo
"#;

const DETAIL_SELECT: &str = r#"
    SELECT d.EntNumero, d.Item, d.ProdCodigo, p.ProdNombre, d.Serie, d.Cantidad, d.Fecha, d.FechaCura, d.Estado
    FROM EntradaDetalle d
    LEFT JOIN Producto p ON p.ProdCodigo = d.ProdCodigo
"#;

pub struct NewEntryHeader<'a> {
    pub ent_numero: i64,
    pub fecha: NaiveDate,
    pub nro_corte: &'a str,
    pub estado: EntryState,
    pub comentario: Option<&'a str>,
    pub usuario_creacion: Option<&'a str>,
    pub fecha_creacion: NaiveDateTime,
    pub prod_codigo: &'a str,
    pub fecha_cura: NaiveDateTime,
}

pub struct NewEntryDetail<'a> {
    pub ent_numero: i64,
    pub item: i64,
    pub prod_codigo: &'a str,
    pub serie: i64,
    pub cantidad: f64,
    pub fecha: NaiveDateTime,
    pub fecha_cura: NaiveDateTime,
    pub estado: &'a str,
}

#[derive(Default)]
pub struct EntryHeaderChanges<'a> {
    pub fecha: Option<NaiveDate>,
    pub nro_corte: Option<&'a str>,
    pub estado: Option<EntryState>,
    pub comentario: Option<&'a str>,
    pub prod_codigo: Option<&'a str>,
    pub fecha_cura: Option<NaiveDateTime>,
}

#[derive(Clone)]
pub struct EntryRepository {
    pool: SqlitePool,
}

// NroCorte repetido y segunda entrada "Abierto" llegan como violaciones de unicidad.
fn map_entry_write_error(e: sqlx::Error, nro_corte: Option<&str>) -> AppError {
    if is_unique_violation_on(&e, "Entrada.NroCorte") {
        return AppError::DuplicateCorte(nro_corte.unwrap_or_default().to_string());
    }
    if is_unique_violation_on(&e, "Entrada.Estado") {
        return AppError::OpenEntryExists(None);
    }
    e.into()
}

impl EntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ---
    // Lecturas
    // ---

    pub async fn find_all(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<Entry>, AppError> {
        let sql = format!("{ENTRY_SELECT} WHERE (?1 IS NULL OR e.Estado = ?1){}", sort.order_by());
        let entries = sqlx::query_as::<_, Entry>(&sql)
            .bind(estado)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    pub async fn find_by_number<'e, E>(&self, executor: E, ent_numero: i64) -> Result<Option<Entry>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{ENTRY_SELECT} WHERE e.EntNumero = ?");
        let entry = sqlx::query_as::<_, Entry>(&sql)
            .bind(ent_numero)
            .fetch_optional(executor)
            .await?;
        Ok(entry)
    }

    pub async fn find_details<'e, E>(&self, executor: E, ent_numero: i64) -> Result<Vec<EntryDetail>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{DETAIL_SELECT} WHERE d.EntNumero = ? ORDER BY d.Item");
        let details = sqlx::query_as::<_, EntryDetail>(&sql)
            .bind(ent_numero)
            .fetch_all(executor)
            .await?;
        Ok(details)
    }

    pub async fn find_detail<'e, E>(
        &self,
        executor: E,
        ent_numero: i64,
        item: i64,
    ) -> Result<Option<EntryDetail>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{DETAIL_SELECT} WHERE d.EntNumero = ? AND d.Item = ?");
        let detail = sqlx::query_as::<_, EntryDetail>(&sql)
            .bind(ent_numero)
            .bind(item)
            .fetch_optional(executor)
            .await?;
        Ok(detail)
    }

    pub async fn find_latest(&self, limit: i64) -> Result<Vec<Entry>, AppError> {
        let sql = format!("{ENTRY_SELECT} ORDER BY e.EntNumero DESC LIMIT ?");
        let entries = sqlx::query_as::<_, Entry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    pub async fn find_open<'e, E>(&self, executor: E) -> Result<Option<Entry>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{ENTRY_SELECT} WHERE e.Estado = ? ORDER BY e.EntNumero LIMIT 1");
        let entry = sqlx::query_as::<_, Entry>(&sql)
            .bind(EntryState::Open)
            .fetch_optional(executor)
            .await?;
        Ok(entry)
    }

    pub async fn corte_exists(&self, nro_corte: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Entrada WHERE NroCorte = ?")
            .bind(nro_corte)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn unique_cortes(&self) -> Result<Vec<String>, AppError> {
        let cortes: Vec<String> = sqlx::query_scalar("SELECT DISTINCT NroCorte FROM Entrada ORDER BY NroCorte")
            .fetch_all(&self.pool)
            .await?;
        Ok(cortes)
    }

    pub async fn count_details<'e, E>(&self, executor: E, ent_numero: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM EntradaDetalle WHERE EntNumero = ?")
            .bind(ent_numero)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    // ---
    // Escrituras (siempre dentro de la transacción del servicio)
    // ---

    pub async fn next_number<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(EntNumero), 0) + 1 FROM Entrada")
            .fetch_one(executor)
            .await?;
        Ok(next)
    }

    pub async fn insert_header<'e, E>(&self, executor: E, header: &NewEntryHeader<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO Entrada
                (EntNumero, Fecha, NroCorte, Estado, Comentario, UsuarioCreacion, FechaCreacion, ProdCodigo, FechaCura)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(header.ent_numero)
        .bind(header.fecha)
        .bind(header.nro_corte)
        .bind(header.estado)
        .bind(header.comentario)
        .bind(header.usuario_creacion)
        .bind(header.fecha_creacion)
        .bind(header.prod_codigo)
        .bind(header.fecha_cura)
        .execute(executor)
        .await
        .map_err(|e| map_entry_write_error(e, Some(header.nro_corte)))?;
        Ok(())
    }

    pub async fn insert_detail<'e, E>(&self, executor: E, detail: &NewEntryDetail<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO EntradaDetalle (EntNumero, Item, ProdCodigo, Serie, Cantidad, Fecha, FechaCura, Estado)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(detail.ent_numero)
        .bind(detail.item)
        .bind(detail.prod_codigo)
        .bind(detail.serie)
        .bind(detail.cantidad)
        .bind(detail.fecha)
        .bind(detail.fecha_cura)
        .bind(detail.estado)
        .execute(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::Conflict(format!("Serie {}", detail.serie));
            }
            e.into()
        })?;
        Ok(())
    }

    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        ent_numero: i64,
        changes: &EntryHeaderChanges<'_>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE Entrada SET
                Fecha      = COALESCE(?, Fecha),
                NroCorte   = COALESCE(?, NroCorte),
                Estado     = COALESCE(?, Estado),
                Comentario = COALESCE(?, Comentario),
                ProdCodigo = COALESCE(?, ProdCodigo),
                FechaCura  = COALESCE(?, FechaCura)
            WHERE EntNumero = ?
            "#,
        )
        .bind(changes.fecha)
        .bind(changes.nro_corte)
        .bind(changes.estado)
        .bind(changes.comentario)
        .bind(changes.prod_codigo)
        .bind(changes.fecha_cura)
        .bind(ent_numero)
        .execute(executor)
        .await
        .map_err(|e| map_entry_write_error(e, changes.nro_corte))?;
        Ok(result.rows_affected())
    }

    pub async fn delete_details<'e, E>(&self, executor: E, ent_numero: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM EntradaDetalle WHERE EntNumero = ?")
            .bind(ent_numero)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_detail<'e, E>(&self, executor: E, ent_numero: i64, item: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM EntradaDetalle WHERE EntNumero = ? AND Item = ?")
            .bind(ent_numero)
            .bind(item)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_header<'e, E>(&self, executor: E, ent_numero: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM Entrada WHERE EntNumero = ?")
            .bind(ent_numero)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Contador global de series (tabla Parametro, fila única)
    // ---

    pub async fn last_serial<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let last: Option<i64> = sqlx::query_scalar("SELECT UltimaSerie FROM Parametro WHERE Id = 1")
            .fetch_optional(executor)
            .await?;
        Ok(last.unwrap_or(0))
    }

    /// `true` si el contador ya emitió `serie` y ninguna línea de detalle la usa.
    pub async fn serial_is_free<'e, E>(&self, executor: E, serie: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let free: bool = sqlx::query_scalar(
            r#"
            SELECT ?1 BETWEEN 1 AND COALESCE((SELECT UltimaSerie FROM Parametro WHERE Id = 1), 0)
               AND NOT EXISTS (SELECT 1 FROM EntradaDetalle WHERE Serie = ?1)
            "#,
        )
        .bind(serie)
        .fetch_one(executor)
        .await?;
        Ok(free)
    }

    /// Incrementa y devuelve la serie en una sola sentencia.
    pub async fn allocate_serial<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let serie: i64 = sqlx::query_scalar(
            "UPDATE Parametro SET UltimaSerie = UltimaSerie + 1 WHERE Id = 1 RETURNING UltimaSerie",
        )
        .fetch_one(executor)
        .await?;
        Ok(serie)
    }
}
