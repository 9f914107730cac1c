// src/db/product_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{
        codes::{like_prefix, max_number_sql, next_code, PRODUCTO_PREFIX},
        db_utils::map_catalog_error,
        error::AppError,
        quantity::round_qty,
        sorting::SortSpec,
    },
    models::{
        products::{Product, ProductType, UpdateProductPayload},
        RecordState,
    },
};

const PRODUCT_SELECT: &str = r#"
    SELECT p.ProdCodigo, p.TipoCodigo, t.TipoNombre, p.ProdNombre, p.ProdEstado, p.Stock, p.HorasCura
    FROM Producto p
    LEFT JOIN TipoProducto t ON t.TipoCodigo = p.TipoCodigo
"#;

#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ---
    // Productos
    // ---

    pub async fn find_all(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE (?1 IS NULL OR p.ProdEstado = ?1){}",
            sort.order_by()
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(estado)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn find_by_code<'e, E>(&self, executor: E, prod_codigo: &str) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{PRODUCT_SELECT} WHERE p.ProdCodigo = ?");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(prod_codigo)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Alta con código secuencial `prNNN`. El stock arranca en cero.
    pub async fn create(
        &self,
        tipo_codigo: i64,
        prod_nombre: &str,
        prod_estado: RecordState,
        horas_cura: i64,
    ) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        if self.find_type(&mut *tx, tipo_codigo).await?.is_none() {
            return Err(AppError::not_found("Tipo de producto", tipo_codigo));
        }

        let last: Option<i64> = sqlx::query_scalar(&max_number_sql("Producto", "ProdCodigo"))
            .bind(like_prefix(PRODUCTO_PREFIX))
            .fetch_one(&mut *tx)
            .await?;
        let prod_codigo = next_code(PRODUCTO_PREFIX, last);

        sqlx::query(
            r#"
            INSERT INTO Producto (ProdCodigo, TipoCodigo, ProdNombre, ProdEstado, Stock, HorasCura)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&prod_codigo)
        .bind(tipo_codigo)
        .bind(prod_nombre)
        .bind(prod_estado)
        .bind(horas_cura)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_catalog_error(e, &prod_codigo))?;

        let product = self
            .find_by_code(&mut *tx, &prod_codigo)
            .await?
            .ok_or_else(|| AppError::not_found("Producto", &prod_codigo))?;

        tx.commit().await?;
        Ok(product)
    }

    pub async fn update(&self, prod_codigo: &str, changes: &UpdateProductPayload) -> Result<Option<Product>, AppError> {
        if let Some(tipo) = changes.tipo_codigo {
            if self.find_type(&self.pool, tipo).await?.is_none() {
                return Err(AppError::not_found("Tipo de producto", tipo));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE Producto SET
                TipoCodigo = COALESCE(?, TipoCodigo),
                ProdNombre = COALESCE(?, ProdNombre),
                ProdEstado = COALESCE(?, ProdEstado),
                HorasCura  = COALESCE(?, HorasCura)
            WHERE ProdCodigo = ?
            "#,
        )
        .bind(changes.tipo_codigo)
        .bind(changes.prod_nombre.as_deref())
        .bind(changes.prod_estado)
        .bind(changes.horas_cura)
        .bind(prod_codigo)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_code(&self.pool, prod_codigo).await
    }

    pub async fn delete(&self, prod_codigo: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM Producto WHERE ProdCodigo = ?")
            .bind(prod_codigo)
            .execute(&self.pool)
            .await
            .map_err(|e| map_catalog_error(e, &format!("Producto {prod_codigo}")))?;
        Ok(result.rows_affected())
    }

    // ---
    // Stock (solo desde Entradas / Salidas, dentro de su transacción)
    // ---

    pub async fn stock_of<'e, E>(&self, executor: E, prod_codigo: &str) -> Result<Option<f64>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let stock: Option<f64> = sqlx::query_scalar("SELECT Stock FROM Producto WHERE ProdCodigo = ?")
            .bind(prod_codigo)
            .fetch_optional(executor)
            .await?;
        Ok(stock.map(round_qty))
    }

    /// Suma `delta` (positivo o negativo) al stock, redondeado a 3 decimales.
    /// Devuelve filas afectadas.
    pub async fn adjust_stock<'e, E>(&self, executor: E, prod_codigo: &str, delta: f64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE Producto SET Stock = ROUND(Stock + ?, 3) WHERE ProdCodigo = ?")
            .bind(round_qty(delta))
            .bind(prod_codigo)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Tipos de producto
    // ---

    pub async fn find_all_types(&self, sort: &SortSpec) -> Result<Vec<ProductType>, AppError> {
        let sql = format!("SELECT t.* FROM TipoProducto t{}", sort.order_by());
        let types = sqlx::query_as::<_, ProductType>(&sql).fetch_all(&self.pool).await?;
        Ok(types)
    }

    pub async fn find_type<'e, E>(&self, executor: E, tipo_codigo: i64) -> Result<Option<ProductType>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product_type = sqlx::query_as::<_, ProductType>("SELECT * FROM TipoProducto WHERE TipoCodigo = ?")
            .bind(tipo_codigo)
            .fetch_optional(executor)
            .await?;
        Ok(product_type)
    }

    // El código es max + 1 en la misma sentencia, así no hay carrera entre lectura y alta.
    pub async fn create_type(&self, tipo_nombre: &str) -> Result<ProductType, AppError> {
        sqlx::query_as::<_, ProductType>(
            r#"
            INSERT INTO TipoProducto (TipoCodigo, TipoNombre)
            SELECT COALESCE(MAX(TipoCodigo), 0) + 1, ? FROM TipoProducto
            RETURNING *
            "#,
        )
        .bind(tipo_nombre)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_catalog_error(e, tipo_nombre))
    }

    pub async fn update_type(&self, tipo_codigo: i64, tipo_nombre: &str) -> Result<Option<ProductType>, AppError> {
        sqlx::query_as::<_, ProductType>(
            "UPDATE TipoProducto SET TipoNombre = ? WHERE TipoCodigo = ? RETURNING *",
        )
        .bind(tipo_nombre)
        .bind(tipo_codigo)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_catalog_error(e, tipo_nombre))
    }

    pub async fn delete_type(&self, tipo_codigo: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM TipoProducto WHERE TipoCodigo = ?")
            .bind(tipo_codigo)
            .execute(&self.pool)
            .await
            .map_err(|e| map_catalog_error(e, &format!("Tipo de producto {tipo_codigo}")))?;
        Ok(result.rows_affected())
    }
}
