//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use plc_backend::{
    app::build_router,
    config::{AppConfig, AppState},
    db::pool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG manda; por defecto info
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let config = AppConfig::from_env().context("No se pudo leer la configuración")?;

    let db_pool = pool::connect(&config)
        .await
        .context("No se pudo abrir la base de datos")?;

    // Las migraciones corren siempre al iniciar
    pool::run_migrations(&db_pool)
        .await
        .context("Fallaron las migraciones de la base de datos")?;

    let server_addr = config.server_addr;
    let bootstrap_admin = config.bootstrap_admin.clone();
    let app_state = AppState::new(db_pool, config);

    if let Some((legajo, password)) = bootstrap_admin {
        app_state
            .user_service
            .ensure_admin(legajo, &password)
            .await
            .map_err(|e| anyhow::anyhow!("No se pudo crear el administrador inicial: {e}"))?;
    }

    let app = build_router(app_state);

    let listener = TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo iniciar el listener TCP en {server_addr}"))?;
    tracing::info!("🚀 Servidor escuchando en {}", listener.local_addr()?);
    tracing::info!("📚 Swagger UI en http://{}/swagger-ui", listener.local_addr()?);

    axum::serve(listener, app).await.context("Error en el servidor Axum")?;
    Ok(())
}
