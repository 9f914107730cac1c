// src/db/user_repo.rs

use chrono::NaiveDateTime;
use sqlx::{types::Json, Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::is_unique_violation, error::AppError, sorting::SortSpec},
    models::{
        users::{Permissions, Role, UpdateUserPayload, User},
        RecordState,
    },
};

// El repositorio de usuarios, responsable de la tabla 'Usuario'
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

pub struct NewUser<'a> {
    pub legajo: i64,
    pub nombre: &'a str,
    pub password_hash: &'a str,
    pub rol: Role,
    pub estado: RecordState,
    pub permisos: Permissions,
    pub fecha_creacion: NaiveDateTime,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find_all(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT u.* FROM Usuario u WHERE (?1 IS NULL OR u.Estado = ?1){}",
            sort.order_by()
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(estado)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn find_by_legajo<'e, E>(&self, executor: E, legajo: i64) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM Usuario WHERE Legajo = ?")
            .bind(legajo)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Usuario")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // Crea un nuevo usuario; el legajo duplicado se informa como conflicto.
    pub async fn create(&self, user: NewUser<'_>) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO Usuario (Legajo, Nombre, Contrasena, Rol, Estado, Permisos, FechaCreacion)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user.legajo)
        .bind(user.nombre)
        .bind(user.password_hash)
        .bind(user.rol)
        .bind(user.estado)
        .bind(Json(user.permisos))
        .bind(user.fecha_creacion)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::Conflict(format!("Legajo {}", user.legajo));
            }
            e.into()
        })
    }

    pub async fn update(&self, legajo: i64, changes: &UpdateUserPayload) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE Usuario SET
                Nombre   = COALESCE(?, Nombre),
                Rol      = COALESCE(?, Rol),
                Estado   = COALESCE(?, Estado),
                Permisos = COALESCE(?, Permisos)
            WHERE Legajo = ?
            RETURNING *
            "#,
        )
        .bind(changes.nombre.as_deref())
        .bind(changes.rol)
        .bind(changes.estado)
        .bind(changes.permisos.clone().map(Json))
        .bind(legajo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn update_password(&self, legajo: i64, password_hash: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE Usuario SET Contrasena = ? WHERE Legajo = ?")
            .bind(password_hash)
            .bind(legajo)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, legajo: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM Usuario WHERE Legajo = ?")
            .bind(legajo)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
