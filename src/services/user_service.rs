// src/services/user_service.rs

use bcrypt::{hash, verify};
use chrono::Local;

use crate::{
    common::{error::AppError, sorting::SortSpec},
    db::{user_repo::NewUser, UserRepository},
    models::{
        users::{LoginResponse, Permissions, Role, UpdateUserPayload, User},
        RecordState,
    },
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    bcrypt_cost: u32,
}

pub struct CreateUser {
    pub legajo: i64,
    pub nombre: String,
    pub contrasena: String,
    pub rol: Role,
    pub estado: RecordState,
    pub permisos: Permissions,
}

impl UserService {
    pub fn new(user_repo: UserRepository, bcrypt_cost: u32) -> Self {
        Self { user_repo, bcrypt_cost }
    }

    // bcrypt es CPU puro: va a un hilo bloqueante para no frenar el runtime
    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falló la tarea de hashing: {}", e))??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falló la tarea de verificación: {}", e))??;
        Ok(valid)
    }

    pub async fn list(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<User>, AppError> {
        self.user_repo.find_all(sort, estado).await
    }

    pub async fn get(&self, legajo: i64) -> Result<User, AppError> {
        self.user_repo
            .find_by_legajo(self.user_repo.pool(), legajo)
            .await?
            .ok_or_else(|| AppError::not_found("Usuario", legajo))
    }

    pub async fn create(&self, user: CreateUser) -> Result<User, AppError> {
        let password_hash = self.hash_password(&user.contrasena).await?;

        let created = self
            .user_repo
            .create(NewUser {
                legajo: user.legajo,
                nombre: &user.nombre,
                password_hash: &password_hash,
                rol: user.rol,
                estado: user.estado,
                permisos: user.permisos,
                fecha_creacion: Local::now().naive_local(),
            })
            .await?;

        tracing::info!("✅ Usuario {} creado con rol {:?}", created.legajo, created.rol);
        Ok(created)
    }

    pub async fn update(&self, legajo: i64, changes: &UpdateUserPayload) -> Result<User, AppError> {
        self.user_repo
            .update(legajo, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Usuario", legajo))
    }

    pub async fn delete(&self, legajo: i64) -> Result<(), AppError> {
        if self.user_repo.delete(legajo).await? == 0 {
            return Err(AppError::not_found("Usuario", legajo));
        }
        tracing::info!("🗑️ Usuario {} eliminado", legajo);
        Ok(())
    }

    /// Cambio de contraseña por el propio usuario: exige la actual.
    pub async fn change_password(&self, legajo: i64, current: &str, new: &str) -> Result<(), AppError> {
        let user = self.get(legajo).await?;

        if !self.verify_password(current, &user.contrasena).await? {
            tracing::warn!("Cambio de contraseña rechazado para el legajo {}", legajo);
            return Err(AppError::WrongCurrentPassword);
        }

        let password_hash = self.hash_password(new).await?;
        self.user_repo.update_password(legajo, &password_hash).await?;
        Ok(())
    }

    /// Blanqueo hecho por un administrador.
    pub async fn reset_password(&self, legajo: i64, new: &str) -> Result<(), AppError> {
        let password_hash = self.hash_password(new).await?;
        if self.user_repo.update_password(legajo, &password_hash).await? == 0 {
            return Err(AppError::not_found("Usuario", legajo));
        }
        tracing::info!("🔑 Contraseña del legajo {} blanqueada", legajo);
        Ok(())
    }

    pub async fn login(&self, legajo: i64, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_legajo(self.user_repo.pool(), legajo)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.verify_password(password, &user.contrasena).await? {
            return Err(AppError::InvalidCredentials);
        }
        if user.estado != RecordState::Active {
            return Err(AppError::InactiveUser);
        }

        let capacidades = user.rol.capabilities();
        Ok(LoginResponse { usuario: user, capacidades })
    }

    /// Con la tabla vacía crea un administrador inicial para poder entrar.
    pub async fn ensure_admin(&self, legajo: i64, password: &str) -> Result<bool, AppError> {
        if self.user_repo.count().await? > 0 {
            return Ok(false);
        }

        self.create(CreateUser {
            legajo,
            nombre: "Administrador".to_string(),
            contrasena: password.to_string(),
            rol: Role::Admin,
            estado: RecordState::Active,
            permisos: Permissions::new(),
        })
        .await?;

        tracing::warn!("⚠️ No había usuarios: se creó el administrador inicial (legajo {})", legajo);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::sorting::USUARIO_SORT,
        db::pool::{connect_in_memory, run_migrations},
    };

    async fn service() -> UserService {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();
        UserService::new(UserRepository::new(pool), 4)
    }

    fn operator(legajo: i64) -> CreateUser {
        CreateUser {
            legajo,
            nombre: "Ana".into(),
            contrasena: "secreta".into(),
            rol: Role::Operador,
            estado: RecordState::Active,
            permisos: Permissions::new(),
        }
    }

    #[tokio::test]
    async fn password_is_stored_hashed_and_login_returns_capabilities() {
        let service = service().await;
        let user = service.create(operator(100)).await.unwrap();
        assert_ne!(user.contrasena, "secreta");

        let login = service.login(100, "secreta").await.unwrap();
        assert_eq!(login.usuario.legajo, 100);
        assert_eq!(login.capacidades, Role::Operador.capabilities());

        assert!(matches!(service.login(100, "otra").await, Err(AppError::InvalidCredentials)));
        assert!(matches!(service.login(999, "secreta").await, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn inactive_user_cannot_log_in() {
        let service = service().await;
        service.create(operator(7)).await.unwrap();
        let changes = UpdateUserPayload {
            estado: Some(RecordState::Inactive),
            ..Default::default()
        };
        service.update(7, &changes).await.unwrap();

        assert!(matches!(service.login(7, "secreta").await, Err(AppError::InactiveUser)));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let service = service().await;
        service.create(operator(5)).await.unwrap();

        let wrong = service.change_password(5, "nope", "nueva1").await;
        assert!(matches!(wrong, Err(AppError::WrongCurrentPassword)));

        service.change_password(5, "secreta", "nueva1").await.unwrap();
        assert!(service.login(5, "nueva1").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_legajo_is_a_conflict() {
        let service = service().await;
        service.create(operator(1)).await.unwrap();
        assert!(matches!(service.create(operator(1)).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn admin_is_bootstrapped_only_once() {
        let service = service().await;
        assert!(service.ensure_admin(1, "admin").await.unwrap());
        assert!(!service.ensure_admin(2, "admin").await.unwrap());

        let users = service.list(&USUARIO_SORT.resolve(None, None), None).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].rol, Role::Admin);
    }
}
