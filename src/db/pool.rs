// src/db/pool.rs

use std::{str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};

use crate::config::AppConfig;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Abre plc.db (lo crea si no existe) con WAL y claves foráneas activas.
pub async fn connect(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        // Escrituras concurrentes esperan el lock en vez de fallar con SQLITE_BUSY
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    tracing::info!("✅ Conexión con la base de datos establecida ({})", config.database_url);
    Ok(pool)
}

/// Base en memoria para tests: una sola conexión que nunca se recicla,
/// si no cada conexión vería una base vacía distinta.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("✅ Migraciones de la base de datos ejecutadas con éxito!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_seed_the_serial_counter() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let ultima: i64 = sqlx::query_scalar("SELECT UltimaSerie FROM Parametro WHERE Id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(ultima, 0);

        // Idempotente
        run_migrations(&pool).await.unwrap();
    }
}
