pub mod dashboard;
pub mod entries;
pub mod exits;
pub mod machines;
pub mod products;
pub mod silos;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Estado "Activo" / "Inactivo" compartido por usuarios, productos, silos y relaciones.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
pub enum RecordState {
    #[default]
    #[serde(rename = "Activo")]
    #[sqlx(rename = "Activo")]
    Active,
    #[serde(rename = "Inactivo")]
    #[sqlx(rename = "Inactivo")]
    Inactive,
}

impl RecordState {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordState::Active => "Activo",
            RecordState::Inactive => "Inactivo",
        }
    }
}
