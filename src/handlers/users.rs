// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{require, ApiError, AppError},
        json::ApiJson,
        sorting::{ListQuery, USUARIO_SORT},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::users::{
        ChangePasswordPayload, CreateUserPayload, LoginPayload, LoginResponse, ResetPasswordPayload,
        UpdateUserPayload, User,
    },
    services::user_service::CreateUser,
};

// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Usuarios",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Usuario y capacidades de su rol", body = LoginResponse),
        (status = 401, description = "Legajo o contraseña incorrectos"),
        (status = 403, description = "Usuario inactivo")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let legajo = require(payload.legajo, "Legajo")?;
        let contrasena = require(payload.contrasena.as_deref(), "Contrasena")?;
        app_state.user_service.login(legajo, contrasena).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

// GET /api/usuario
#[utoipa::path(
    get,
    path = "/api/usuario",
    tag = "Usuarios",
    params(ListQuery),
    responses((status = 200, description = "Lista de usuarios", body = Vec<User>))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list(&query.sort(&USUARIO_SORT), query.estado())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(users)))
}

// GET /api/usuario/{legajo}
#[utoipa::path(
    get,
    path = "/api/usuario/{legajo}",
    tag = "Usuarios",
    params(("legajo" = i64, Path, description = "Legajo del empleado")),
    responses(
        (status = 200, description = "Usuario", body = User),
        (status = 404, description = "No existe")
    )
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(legajo): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .get(legajo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}

// POST /api/usuario
#[utoipa::path(
    post,
    path = "/api/usuario",
    tag = "Usuarios",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuario creado", body = User),
        (status = 400, description = "Datos inválidos"),
        (status = 409, description = "Legajo repetido")
    )
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = async {
        let new_user = CreateUser {
            legajo: require(payload.legajo, "Legajo")?,
            nombre: require(payload.nombre, "Nombre")?,
            contrasena: require(payload.contrasena, "Contrasena")?,
            rol: require(payload.rol, "Rol")?,
            estado: payload.estado.unwrap_or_default(),
            permisos: payload.permisos.unwrap_or_default(),
        };
        app_state.user_service.create(new_user).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

// PUT /api/usuario/{legajo}
#[utoipa::path(
    put,
    path = "/api/usuario/{legajo}",
    tag = "Usuarios",
    params(("legajo" = i64, Path, description = "Legajo del empleado")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuario modificado", body = User),
        (status = 404, description = "No existe")
    )
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(legajo): Path<i64>,
    ApiJson(payload): ApiJson<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .update(legajo, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}

// PUT /api/usuario/{legajo}/contrasena
#[utoipa::path(
    put,
    path = "/api/usuario/{legajo}/contrasena",
    tag = "Usuarios",
    params(("legajo" = i64, Path, description = "Legajo del empleado")),
    request_body = ChangePasswordPayload,
    responses(
        (status = 204, description = "Contraseña cambiada"),
        (status = 400, description = "La contraseña actual no coincide"),
        (status = 404, description = "No existe")
    )
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(legajo): Path<i64>,
    ApiJson(payload): ApiJson<ChangePasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    async {
        let actual = require(payload.contrasena_actual.as_deref(), "ContrasenaActual")?;
        let nueva = require(payload.contrasena_nueva.as_deref(), "ContrasenaNueva")?;
        app_state.user_service.change_password(legajo, actual, nueva).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/usuario/{legajo}/reset-contrasena
#[utoipa::path(
    put,
    path = "/api/usuario/{legajo}/reset-contrasena",
    tag = "Usuarios",
    params(("legajo" = i64, Path, description = "Legajo del empleado")),
    request_body = ResetPasswordPayload,
    responses(
        (status = 204, description = "Contraseña blanqueada"),
        (status = 404, description = "No existe")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(legajo): Path<i64>,
    ApiJson(payload): ApiJson<ResetPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    async {
        let nueva = require(payload.contrasena_nueva.as_deref(), "ContrasenaNueva")?;
        app_state.user_service.reset_password(legajo, nueva).await
    }
    .await
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/usuario/{legajo}
#[utoipa::path(
    delete,
    path = "/api/usuario/{legajo}",
    tag = "Usuarios",
    params(("legajo" = i64, Path, description = "Legajo del empleado")),
    responses(
        (status = 204, description = "Usuario eliminado"),
        (status = 404, description = "No existe")
    )
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(legajo): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .user_service
        .delete(legajo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
