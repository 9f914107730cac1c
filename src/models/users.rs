// src/models/users.rs

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::RecordState;

/// Permisos por grupo: nombre de grupo -> módulos habilitados.
pub type Permissions = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Operador,
    Supervisor,
    Auditor,
    Admin,
}

// Usuario tal como se lee de la tabla Usuario
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct User {
    pub legajo: i64,
    pub nombre: String,

    #[serde(skip_serializing)]
    pub contrasena: String,

    pub rol: Role,
    pub estado: RecordState,

    #[schema(value_type = Object)]
    pub permisos: Json<Permissions>,

    pub fecha_creacion: NaiveDateTime,
}

// ---
// Capacidades por rol
// ---
// Un único flujo de Entradas/Salidas parametrizado por lo que el rol puede hacer,
// en lugar de una variante de formulario por rol.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Campos de la entrada que el rol puede editar.
    #[schema(value_type = Vec<String>)]
    pub editable_entry_fields: Vec<&'static str>,
    pub capture_weight: bool,
    pub print_ticket: bool,
    pub close_entries: bool,
    pub void_entries: bool,
    pub delete_entries: bool,
    pub create_exits: bool,
    pub manage_catalogs: bool,
    pub manage_users: bool,
}

const ALL_ENTRY_FIELDS: &[&str] = &[
    "Fecha",
    "NroCorte",
    "Estado",
    "Comentario",
    "ProdCodigo",
    "Cantidad",
];

impl Role {
    pub fn capabilities(self) -> Capabilities {
        match self {
            Role::Operador => Capabilities {
                editable_entry_fields: vec!["ProdCodigo", "Cantidad"],
                capture_weight: true,
                print_ticket: true,
                close_entries: false,
                void_entries: false,
                delete_entries: false,
                create_exits: true,
                manage_catalogs: false,
                manage_users: false,
            },
            Role::Supervisor => Capabilities {
                editable_entry_fields: ALL_ENTRY_FIELDS.to_vec(),
                capture_weight: true,
                print_ticket: true,
                close_entries: true,
                void_entries: true,
                delete_entries: false,
                create_exits: true,
                manage_catalogs: true,
                manage_users: false,
            },
            // Solo lectura
            Role::Auditor => Capabilities {
                editable_entry_fields: Vec::new(),
                capture_weight: false,
                print_ticket: false,
                close_entries: false,
                void_entries: false,
                delete_entries: false,
                create_exits: false,
                manage_catalogs: false,
                manage_users: false,
            },
            Role::Admin => Capabilities {
                editable_entry_fields: ALL_ENTRY_FIELDS.to_vec(),
                capture_weight: true,
                print_ticket: true,
                close_entries: true,
                void_entries: true,
                delete_entries: true,
                create_exits: true,
                manage_catalogs: true,
                manage_users: true,
            },
        }
    }
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateUserPayload {
    #[validate(required(message = "El campo 'Legajo' es obligatorio."))]
    pub legajo: Option<i64>,

    #[validate(
        required(message = "El campo 'Nombre' es obligatorio."),
        length(min = 1, message = "El nombre no puede estar vacío.")
    )]
    pub nombre: Option<String>,

    #[validate(
        required(message = "El campo 'Contrasena' es obligatorio."),
        length(min = 4, message = "La contraseña debe tener al menos 4 caracteres.")
    )]
    pub contrasena: Option<String>,

    #[validate(required(message = "El campo 'Rol' es obligatorio."))]
    pub rol: Option<Role>,

    pub estado: Option<RecordState>,

    #[schema(value_type = Option<Object>)]
    pub permisos: Option<Permissions>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "El nombre no puede estar vacío."))]
    pub nombre: Option<String>,
    pub rol: Option<Role>,
    pub estado: Option<RecordState>,
    #[schema(value_type = Option<Object>)]
    pub permisos: Option<Permissions>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ChangePasswordPayload {
    #[validate(required(message = "El campo 'ContrasenaActual' es obligatorio."))]
    pub contrasena_actual: Option<String>,

    #[validate(
        required(message = "El campo 'ContrasenaNueva' es obligatorio."),
        length(min = 4, message = "La contraseña debe tener al menos 4 caracteres.")
    )]
    pub contrasena_nueva: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ResetPasswordPayload {
    #[validate(
        required(message = "El campo 'ContrasenaNueva' es obligatorio."),
        length(min = 4, message = "La contraseña debe tener al menos 4 caracteres.")
    )]
    pub contrasena_nueva: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LoginPayload {
    #[serde(alias = "legajo")]
    #[validate(required(message = "El campo 'Legajo' es obligatorio."))]
    pub legajo: Option<i64>,

    #[serde(alias = "contrasena")]
    #[validate(required(message = "El campo 'Contrasena' es obligatorio."))]
    pub contrasena: Option<String>,
}

// Respuesta del login: no hay token, la sesión la guarda el cliente.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub usuario: User,
    pub capacidades: Capabilities,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auditor_is_read_only() {
        let caps = Role::Auditor.capabilities();
        assert!(caps.editable_entry_fields.is_empty());
        assert!(!caps.create_exits && !caps.close_entries && !caps.manage_users);
    }

    #[test]
    fn only_admin_manages_users_and_deletes_entries() {
        for role in [Role::Operador, Role::Supervisor, Role::Auditor] {
            let caps = role.capabilities();
            assert!(!caps.manage_users);
            assert!(!caps.delete_entries);
        }
        let admin = Role::Admin.capabilities();
        assert!(admin.manage_users && admin.delete_entries);
    }

    #[test]
    fn operator_can_weigh_but_not_close() {
        let caps = Role::Operador.capabilities();
        assert!(caps.capture_weight && caps.print_ticket);
        assert!(!caps.close_entries);
        assert_eq!(caps.editable_entry_fields, vec!["ProdCodigo", "Cantidad"]);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Supervisor).unwrap(), "\"supervisor\"");
    }
}
