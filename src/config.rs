// src/config.rs

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use sqlx::SqlitePool;

use crate::{
    common::i18n::I18nStore,
    db::{
        DashboardRepository, EntryRepository, ExitRepository, MachineRepository, ProductRepository,
        SiloBlendRepository, SiloRepository, UserRepository,
    },
    services::{
        dashboard_service::DashboardService, entry_service::EntryService, exit_service::ExitService,
        user_service::UserService,
    },
};

// ---
// Configuración leída del entorno (.env)
// ---
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_addr: SocketAddr,
    pub db_max_connections: u32,
    /// Orígenes CORS exactos.
    pub cors_origins: Vec<String>,
    /// Prefijos de origen aceptados (red local), p. ej. `http://192.168.`.
    pub cors_subnet_prefixes: Vec<String>,
    pub bcrypt_cost: u32,
    /// Administrador inicial si la tabla Usuario está vacía.
    pub bootstrap_admin: Option<(i64, String)>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let server_addr = var_or("SERVER_ADDR", "0.0.0.0:5000")
            .parse()
            .context("SERVER_ADDR no es una dirección válida")?;
        let db_max_connections = var_or("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS debe ser un número")?;
        let bcrypt_cost = var_or("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())
            .parse()
            .context("BCRYPT_COST debe ser un número")?;

        let bootstrap_admin = match env::var("BOOTSTRAP_ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()) {
            Some(password) => {
                let legajo = var_or("BOOTSTRAP_ADMIN_LEGAJO", "1")
                    .parse()
                    .context("BOOTSTRAP_ADMIN_LEGAJO debe ser un número")?;
                Some((legajo, password))
            }
            None => None,
        };

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://plc.db"),
            server_addr,
            db_max_connections,
            cors_origins: csv(&var_or("CORS_ORIGINS", "http://localhost:3000,http://127.0.0.1:3000")),
            cors_subnet_prefixes: csv(&var_or("CORS_SUBNET_PREFIXES", "http://192.168.")),
            bcrypt_cost,
            bootstrap_admin,
        })
    }

    /// Configuración para tests: base en memoria y bcrypt barato.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            server_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_max_connections: 1,
            cors_origins: vec!["http://localhost:3000".to_string()],
            cors_subnet_prefixes: vec!["http://192.168.".to_string()],
            bcrypt_cost: 4,
            bootstrap_admin: None,
        }
    }

    /// ¿El origen está en la lista o dentro de alguna subred permitida?
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.iter().any(|o| o == origin)
            || self.cors_subnet_prefixes.iter().any(|prefix| origin.starts_with(prefix.as_str()))
    }
}

// ---
// Estado compartido por los handlers
// ---
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,

    // Catálogos: los handlers usan los repositorios directamente
    pub product_repo: ProductRepository,
    pub machine_repo: MachineRepository,
    pub silo_repo: SiloRepository,
    pub silo_blend_repo: SiloBlendRepository,

    pub user_service: UserService,
    pub entry_service: EntryService,
    pub exit_service: ExitService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    // Monta el gráfico de dependencias sobre un pool ya conectado y migrado
    pub fn new(db_pool: SqlitePool, config: AppConfig) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let machine_repo = MachineRepository::new(db_pool.clone());
        let silo_repo = SiloRepository::new(db_pool.clone());
        let silo_blend_repo = SiloBlendRepository::new(db_pool.clone());
        let entry_repo = EntryRepository::new(db_pool.clone());
        let exit_repo = ExitRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let user_service = UserService::new(user_repo, config.bcrypt_cost);
        let entry_service = EntryService::new(db_pool.clone(), entry_repo, product_repo.clone());
        let exit_service = ExitService::new(
            db_pool.clone(),
            exit_repo,
            product_repo.clone(),
            silo_blend_repo.clone(),
        );
        let dashboard_service = DashboardService::new(dashboard_repo);

        Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            product_repo,
            machine_repo,
            silo_repo,
            silo_blend_repo,
            user_service,
            entry_service,
            exit_service,
            dashboard_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_trims_and_skips_blanks() {
        assert_eq!(csv(" a , ,b,"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn origins_match_exactly_or_by_subnet_prefix() {
        let config = AppConfig::for_tests();
        assert!(config.is_origin_allowed("http://localhost:3000"));
        assert!(config.is_origin_allowed("http://192.168.0.15:3000"));
        assert!(!config.is_origin_allowed("http://localhost:3001"));
        assert!(!config.is_origin_allowed("http://10.0.0.2:3000"));
    }
}
