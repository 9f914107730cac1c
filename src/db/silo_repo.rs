// src/db/silo_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{
        codes::{like_prefix, max_number_sql, next_code, SILO_PREFIX},
        db_utils::map_catalog_error,
        error::AppError,
        sorting::SortSpec,
    },
    models::{
        silos::{Silo, UpdateSiloPayload},
        RecordState,
    },
};

#[derive(Clone)]
pub struct SiloRepository {
    pool: SqlitePool,
}

impl SiloRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<Silo>, AppError> {
        let sql = format!(
            "SELECT s.* FROM Silo s WHERE (?1 IS NULL OR s.SiloEstado = ?1){}",
            sort.order_by()
        );
        let silos = sqlx::query_as::<_, Silo>(&sql)
            .bind(estado)
            .fetch_all(&self.pool)
            .await?;
        Ok(silos)
    }

    pub async fn find_by_code<'e, E>(&self, executor: E, silo_codigo: &str) -> Result<Option<Silo>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let silo = sqlx::query_as::<_, Silo>("SELECT * FROM Silo WHERE SiloCodigo = ?")
            .bind(silo_codigo)
            .fetch_optional(executor)
            .await?;
        Ok(silo)
    }

    /// Alta con código `siNNN`.
    pub async fn create(
        &self,
        silo_nombre: &str,
        direccion_ip: Option<&str>,
        silo_estado: RecordState,
    ) -> Result<Silo, AppError> {
        let mut tx = self.pool.begin().await?;

        let last: Option<i64> = sqlx::query_scalar(&max_number_sql("Silo", "SiloCodigo"))
            .bind(like_prefix(SILO_PREFIX))
            .fetch_one(&mut *tx)
            .await?;
        let silo_codigo = next_code(SILO_PREFIX, last);

        let silo = sqlx::query_as::<_, Silo>(
            r#"
            INSERT INTO Silo (SiloCodigo, SiloNombre, DireccionIP, SiloEstado)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&silo_codigo)
        .bind(silo_nombre)
        .bind(direccion_ip)
        .bind(silo_estado)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_catalog_error(e, &silo_codigo))?;

        tx.commit().await?;
        Ok(silo)
    }

    pub async fn update(&self, silo_codigo: &str, changes: &UpdateSiloPayload) -> Result<Option<Silo>, AppError> {
        let silo = sqlx::query_as::<_, Silo>(
            r#"
            UPDATE Silo SET
                SiloNombre  = COALESCE(?, SiloNombre),
                DireccionIP = COALESCE(?, DireccionIP),
                SiloEstado  = COALESCE(?, SiloEstado)
            WHERE SiloCodigo = ?
            RETURNING *
            "#,
        )
        .bind(changes.silo_nombre.as_deref())
        .bind(changes.direccion_ip.as_deref())
        .bind(changes.silo_estado)
        .bind(silo_codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(silo)
    }

    pub async fn delete(&self, silo_codigo: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM Silo WHERE SiloCodigo = ?")
            .bind(silo_codigo)
            .execute(&self.pool)
            .await
            .map_err(|e| map_catalog_error(e, &format!("Silo {silo_codigo}")))?;
        Ok(result.rows_affected())
    }
}
