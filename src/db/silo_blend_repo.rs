// src/db/silo_blend_repo.rs

use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};

use crate::{
    common::{db_utils::map_catalog_error, error::AppError, sorting::SortSpec},
    models::{
        silos::{SiloBlend, SiloBlendMachine, SiloBlendWithMachines, UpdateSiloBlendPayload},
        RecordState,
    },
};

const BLEND_SELECT: &str = r#"
    SELECT r.RelNumero, r.ProdCodigo, p.ProdNombre, r.SiloCodigo, s.SiloNombre, r.NroCorte, r.Estado
    FROM RelSiloBlend r
    LEFT JOIN Producto p ON p.ProdCodigo = r.ProdCodigo
    LEFT JOIN Silo s ON s.SiloCodigo = r.SiloCodigo
"#;

const MACHINE_SELECT: &str = r#"
    SELECT d.RelNumero, d.Item, d.MaqCodigo, m.MaqNombre, d.Estado
    FROM RelSiloBlendDetalle d
    LEFT JOIN Maquina m ON m.MaqCodigo = d.MaqCodigo
"#;

#[derive(Clone)]
pub struct SiloBlendRepository {
    pool: SqlitePool,
}

pub struct NewSiloBlend<'a> {
    pub prod_codigo: &'a str,
    pub silo_codigo: &'a str,
    pub nro_corte: Option<&'a str>,
    pub estado: RecordState,
    pub maquinas: &'a [String],
}

impl SiloBlendRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ---
    // Cabecera (RelSiloBlend)
    // ---

    pub async fn find_all(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<SiloBlend>, AppError> {
        let sql = format!("{BLEND_SELECT} WHERE (?1 IS NULL OR r.Estado = ?1){}", sort.order_by());
        let blends = sqlx::query_as::<_, SiloBlend>(&sql)
            .bind(estado)
            .fetch_all(&self.pool)
            .await?;
        Ok(blends)
    }

    pub async fn find_by_number<'e, E>(&self, executor: E, rel_numero: i64) -> Result<Option<SiloBlend>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{BLEND_SELECT} WHERE r.RelNumero = ?");
        let blend = sqlx::query_as::<_, SiloBlend>(&sql)
            .bind(rel_numero)
            .fetch_optional(executor)
            .await?;
        Ok(blend)
    }

    pub async fn find_with_machines(&self, rel_numero: i64) -> Result<Option<SiloBlendWithMachines>, AppError> {
        let Some(relacion) = self.find_by_number(&self.pool, rel_numero).await? else {
            return Ok(None);
        };
        let maquinas = self.find_machines(&self.pool, rel_numero).await?;
        Ok(Some(SiloBlendWithMachines { relacion, maquinas }))
    }

    /// Alta de la cabecera y sus máquinas (Item 1..n) en una única transacción.
    pub async fn create(&self, new: NewSiloBlend<'_>) -> Result<SiloBlendWithMachines, AppError> {
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, "SELECT 1 FROM Producto WHERE ProdCodigo = ?", "Producto", new.prod_codigo).await?;
        ensure_exists(&mut tx, "SELECT 1 FROM Silo WHERE SiloCodigo = ?", "Silo", new.silo_codigo).await?;

        let rel_numero: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(RelNumero), 0) + 1 FROM RelSiloBlend")
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO RelSiloBlend (RelNumero, ProdCodigo, SiloCodigo, NroCorte, Estado)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(rel_numero)
        .bind(new.prod_codigo)
        .bind(new.silo_codigo)
        .bind(new.nro_corte)
        .bind(new.estado)
        .execute(&mut *tx)
        .await?;

        for (index, maq_codigo) in new.maquinas.iter().enumerate() {
            ensure_exists(&mut tx, "SELECT 1 FROM Maquina WHERE MaqCodigo = ?", "Máquina", maq_codigo).await?;
            sqlx::query("INSERT INTO RelSiloBlendDetalle (RelNumero, Item, MaqCodigo, Estado) VALUES (?, ?, ?, ?)")
                .bind(rel_numero)
                .bind(index as i64 + 1)
                .bind(maq_codigo)
                .bind(RecordState::Active)
                .execute(&mut *tx)
                .await?;
        }

        let relacion = self
            .find_by_number(&mut *tx, rel_numero)
            .await?
            .ok_or_else(|| AppError::not_found("Relación silo-blend", rel_numero))?;
        let maquinas = self.find_machines(&mut *tx, rel_numero).await?;

        tx.commit().await?;
        Ok(SiloBlendWithMachines { relacion, maquinas })
    }

    pub async fn update(&self, rel_numero: i64, changes: &UpdateSiloBlendPayload) -> Result<Option<SiloBlend>, AppError> {
        let mut tx = self.pool.begin().await?;

        if let Some(prod) = changes.prod_codigo.as_deref() {
            ensure_exists(&mut tx, "SELECT 1 FROM Producto WHERE ProdCodigo = ?", "Producto", prod).await?;
        }
        if let Some(silo) = changes.silo_codigo.as_deref() {
            ensure_exists(&mut tx, "SELECT 1 FROM Silo WHERE SiloCodigo = ?", "Silo", silo).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE RelSiloBlend SET
                ProdCodigo = COALESCE(?, ProdCodigo),
                SiloCodigo = COALESCE(?, SiloCodigo),
                NroCorte   = COALESCE(?, NroCorte),
                Estado     = COALESCE(?, Estado)
            WHERE RelNumero = ?
            "#,
        )
        .bind(changes.prod_codigo.as_deref())
        .bind(changes.silo_codigo.as_deref())
        .bind(changes.nro_corte.as_deref())
        .bind(changes.estado)
        .bind(rel_numero)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let blend = self.find_by_number(&mut *tx, rel_numero).await?;
        tx.commit().await?;
        Ok(blend)
    }

    /// Borra el detalle y luego la cabecera. Una relación usada por Salidas no se puede borrar.
    pub async fn delete(&self, rel_numero: i64) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM RelSiloBlendDetalle WHERE RelNumero = ?")
            .bind(rel_numero)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM RelSiloBlend WHERE RelNumero = ?")
            .bind(rel_numero)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_catalog_error(e, &format!("Relación {rel_numero}")))?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    // ---
    // Detalle (RelSiloBlendDetalle)
    // ---

    pub async fn find_machines<'e, E>(&self, executor: E, rel_numero: i64) -> Result<Vec<SiloBlendMachine>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{MACHINE_SELECT} WHERE d.RelNumero = ? ORDER BY d.Item");
        let machines = sqlx::query_as::<_, SiloBlendMachine>(&sql)
            .bind(rel_numero)
            .fetch_all(executor)
            .await?;
        Ok(machines)
    }

    pub async fn add_machine(
        &self,
        rel_numero: i64,
        maq_codigo: &str,
        estado: RecordState,
    ) -> Result<SiloBlendMachine, AppError> {
        let mut tx = self.pool.begin().await?;

        if self.find_by_number(&mut *tx, rel_numero).await?.is_none() {
            return Err(AppError::not_found("Relación silo-blend", rel_numero));
        }
        ensure_exists(&mut tx, "SELECT 1 FROM Maquina WHERE MaqCodigo = ?", "Máquina", maq_codigo).await?;

        let item: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(Item), 0) + 1 FROM RelSiloBlendDetalle WHERE RelNumero = ?")
                .bind(rel_numero)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("INSERT INTO RelSiloBlendDetalle (RelNumero, Item, MaqCodigo, Estado) VALUES (?, ?, ?, ?)")
            .bind(rel_numero)
            .bind(item)
            .bind(maq_codigo)
            .bind(estado)
            .execute(&mut *tx)
            .await?;

        let machine = self
            .find_machine(&mut *tx, rel_numero, item)
            .await?
            .ok_or_else(|| AppError::not_found("Máquina de la relación", format!("{rel_numero}/{item}")))?;

        tx.commit().await?;
        Ok(machine)
    }

    pub async fn find_machine<'e, E>(
        &self,
        executor: E,
        rel_numero: i64,
        item: i64,
    ) -> Result<Option<SiloBlendMachine>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{MACHINE_SELECT} WHERE d.RelNumero = ? AND d.Item = ?");
        let machine = sqlx::query_as::<_, SiloBlendMachine>(&sql)
            .bind(rel_numero)
            .bind(item)
            .fetch_optional(executor)
            .await?;
        Ok(machine)
    }

    pub async fn update_machine_state(
        &self,
        rel_numero: i64,
        item: i64,
        estado: RecordState,
    ) -> Result<Option<SiloBlendMachine>, AppError> {
        let result = sqlx::query("UPDATE RelSiloBlendDetalle SET Estado = ? WHERE RelNumero = ? AND Item = ?")
            .bind(estado)
            .bind(rel_numero)
            .bind(item)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_machine(&self.pool, rel_numero, item).await
    }

    pub async fn delete_machine(&self, rel_numero: i64, item: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM RelSiloBlendDetalle WHERE RelNumero = ? AND Item = ?")
            .bind(rel_numero)
            .bind(item)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn ensure_exists(
    conn: &mut SqliteConnection,
    sql: &str,
    entity: &'static str,
    key: &str,
) -> Result<(), AppError> {
    let found: Option<i64> = sqlx::query_scalar(sql).bind(key).fetch_optional(&mut *conn).await?;
    match found {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(entity, key)),
    }
}
