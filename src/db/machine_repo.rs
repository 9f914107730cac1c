// src/db/machine_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{
        codes::{like_prefix, max_number_sql, next_code, MAQUINA_PREFIX},
        db_utils::map_catalog_error,
        error::AppError,
        sorting::SortSpec,
    },
    models::machines::Machine,
};

#[derive(Clone)]
pub struct MachineRepository {
    pool: SqlitePool,
}

impl MachineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self, sort: &SortSpec) -> Result<Vec<Machine>, AppError> {
        let sql = format!("SELECT m.* FROM Maquina m{}", sort.order_by());
        let machines = sqlx::query_as::<_, Machine>(&sql).fetch_all(&self.pool).await?;
        Ok(machines)
    }

    pub async fn find_by_code<'e, E>(&self, executor: E, maq_codigo: &str) -> Result<Option<Machine>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let machine = sqlx::query_as::<_, Machine>("SELECT * FROM Maquina WHERE MaqCodigo = ?")
            .bind(maq_codigo)
            .fetch_optional(executor)
            .await?;
        Ok(machine)
    }

    /// Alta con código `mqNNN` y auditoría de creación.
    pub async fn create(
        &self,
        maq_nombre: &str,
        usuario_creacion: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Machine, AppError> {
        let mut tx = self.pool.begin().await?;

        let last: Option<i64> = sqlx::query_scalar(&max_number_sql("Maquina", "MaqCodigo"))
            .bind(like_prefix(MAQUINA_PREFIX))
            .fetch_one(&mut *tx)
            .await?;
        let maq_codigo = next_code(MAQUINA_PREFIX, last);

        let machine = sqlx::query_as::<_, Machine>(
            r#"
            INSERT INTO Maquina (MaqCodigo, MaqNombre, UsuarioCreacion, FechaCreacion)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&maq_codigo)
        .bind(maq_nombre)
        .bind(usuario_creacion)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_catalog_error(e, &maq_codigo))?;

        tx.commit().await?;
        Ok(machine)
    }

    pub async fn update(
        &self,
        maq_codigo: &str,
        maq_nombre: Option<&str>,
        usuario_modificacion: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Option<Machine>, AppError> {
        let machine = sqlx::query_as::<_, Machine>(
            r#"
            UPDATE Maquina SET
                MaqNombre           = COALESCE(?, MaqNombre),
                UsuarioModificacion = ?,
                FechaModificacion   = ?
            WHERE MaqCodigo = ?
            RETURNING *
            "#,
        )
        .bind(maq_nombre)
        .bind(usuario_modificacion)
        .bind(now)
        .bind(maq_codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(machine)
    }

    pub async fn delete(&self, maq_codigo: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM Maquina WHERE MaqCodigo = ?")
            .bind(maq_codigo)
            .execute(&self.pool)
            .await
            .map_err(|e| map_catalog_error(e, &format!("Máquina {maq_codigo}")))?;
        Ok(result.rows_affected())
    }
}
