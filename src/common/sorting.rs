// src/common/sorting.rs

use serde::Deserialize;
use utoipa::IntoParams;

// Query string común de los listados: ?sortBy=&order=&estado=
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Campo lógico de orden (p. ej. `Stock`). Si no está permitido se usa el default.
    pub sort_by: Option<String>,
    /// `ASC` o `DESC` (por defecto `ASC`).
    pub order: Option<String>,
    /// Filtro por estado (p. ej. `Activo`, `Abierto`).
    pub estado: Option<String>,
}

impl ListQuery {
    pub fn sort(&self, table: &SortTable) -> SortSpec {
        table.resolve(self.sort_by.as_deref(), self.order.as_deref())
    }

    pub fn estado(&self) -> Option<&str> {
        self.estado.as_deref().filter(|e| !e.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(o) if o.trim().eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Tabla de columnas ordenables de una entidad: nombre lógico -> columna calificada.
///
/// Es la única fuente de texto que termina interpolado en un `ORDER BY`; cualquier
/// valor que no esté en `columns` cae en `default`.
#[derive(Debug)]
pub struct SortTable {
    pub default: &'static str,
    pub tiebreak: &'static str,
    pub columns: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub column: &'static str,
    pub order: SortOrder,
    tiebreak: &'static str,
}

impl SortTable {
    pub fn resolve(&self, sort_by: Option<&str>, order: Option<&str>) -> SortSpec {
        let requested = sort_by.map(str::trim).unwrap_or(self.default);
        let (field, column) = self
            .lookup(requested)
            .or_else(|| self.lookup(self.default))
            .unwrap_or((self.default, self.tiebreak));

        SortSpec {
            field,
            column,
            order: SortOrder::parse(order),
            tiebreak: self.tiebreak,
        }
    }

    fn lookup(&self, field: &str) -> Option<(&'static str, &'static str)> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .copied()
    }
}

impl SortSpec {
    pub fn order_by(&self) -> String {
        if self.column == self.tiebreak {
            format!(" ORDER BY {} {}", self.column, self.order.as_sql())
        } else {
            format!(
                " ORDER BY {} {}, {} ASC",
                self.column,
                self.order.as_sql(),
                self.tiebreak
            )
        }
    }
}

// ---
// Tablas por entidad
// ---

pub const USUARIO_SORT: SortTable = SortTable {
    default: "Legajo",
    tiebreak: "u.Legajo",
    columns: &[
        ("Legajo", "u.Legajo"),
        ("Nombre", "u.Nombre"),
        ("Rol", "u.Rol"),
        ("Estado", "u.Estado"),
        ("FechaCreacion", "u.FechaCreacion"),
    ],
};

pub const TIPO_PRODUCTO_SORT: SortTable = SortTable {
    default: "TipoCodigo",
    tiebreak: "t.TipoCodigo",
    columns: &[("TipoCodigo", "t.TipoCodigo"), ("TipoNombre", "t.TipoNombre")],
};

pub const PRODUCTO_SORT: SortTable = SortTable {
    default: "ProdCodigo",
    tiebreak: "p.ProdCodigo",
    columns: &[
        ("ProdCodigo", "p.ProdCodigo"),
        ("ProdNombre", "p.ProdNombre"),
        ("Stock", "p.Stock"),
        ("TipoCodigo", "p.TipoCodigo"),
        ("TipoNombre", "t.TipoNombre"),
        ("HorasCura", "p.HorasCura"),
        ("ProdEstado", "p.ProdEstado"),
    ],
};

pub const MAQUINA_SORT: SortTable = SortTable {
    default: "MaqCodigo",
    tiebreak: "m.MaqCodigo",
    columns: &[
        ("MaqCodigo", "m.MaqCodigo"),
        ("MaqNombre", "m.MaqNombre"),
        ("FechaCreacion", "m.FechaCreacion"),
        ("FechaModificacion", "m.FechaModificacion"),
    ],
};

pub const SILO_SORT: SortTable = SortTable {
    default: "SiloCodigo",
    tiebreak: "s.SiloCodigo",
    columns: &[
        ("SiloCodigo", "s.SiloCodigo"),
        ("SiloNombre", "s.SiloNombre"),
        ("DireccionIP", "s.DireccionIP"),
        ("SiloEstado", "s.SiloEstado"),
    ],
};

pub const REL_SILO_SORT: SortTable = SortTable {
    default: "RelNumero",
    tiebreak: "r.RelNumero",
    columns: &[
        ("RelNumero", "r.RelNumero"),
        ("ProdCodigo", "r.ProdCodigo"),
        ("SiloCodigo", "r.SiloCodigo"),
        ("NroCorte", "r.NroCorte"),
        ("Estado", "r.Estado"),
    ],
};

pub const ENTRADA_SORT: SortTable = SortTable {
    default: "EntNumero",
    tiebreak: "e.EntNumero",
    columns: &[
        ("EntNumero", "e.EntNumero"),
        ("Fecha", "e.Fecha"),
        ("NroCorte", "e.NroCorte"),
        ("Estado", "e.Estado"),
        ("FechaCreacion", "e.FechaCreacion"),
        ("ProdCodigo", "e.ProdCodigo"),
    ],
};

// Las salidas se ordenan en memoria después de agruparlas, por eso las
// "columnas" son los campos del grupo y no columnas SQL.
pub const SALIDA_SORT: SortTable = SortTable {
    default: "SalNumero",
    tiebreak: "SalNumero",
    columns: &[
        ("SalNumero", "SalNumero"),
        ("FechaCreacion", "FechaCreacion"),
        ("UsuarioCreacion", "UsuarioCreacion"),
        ("CantidadTotal", "CantidadTotal"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_column_is_used_with_desc() {
        let spec = PRODUCTO_SORT.resolve(Some("Stock"), Some("DESC"));
        assert_eq!(spec.field, "Stock");
        assert_eq!(spec.order, SortOrder::Desc);
        assert_eq!(spec.order_by(), " ORDER BY p.Stock DESC, p.ProdCodigo ASC");
    }

    #[test]
    fn unknown_column_falls_back_to_default() {
        let spec = PRODUCTO_SORT.resolve(Some("Stock; DROP TABLE Producto"), Some("desc"));
        assert_eq!(spec.field, "ProdCodigo");
        assert_eq!(spec.order_by(), " ORDER BY p.ProdCodigo DESC");
    }

    #[test]
    fn order_defaults_to_asc_and_is_case_insensitive() {
        assert_eq!(SortOrder::parse(None), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("dEsC")), SortOrder::Desc);
    }

    #[test]
    fn field_lookup_ignores_case() {
        let spec = ENTRADA_SORT.resolve(Some("nrocorte"), None);
        assert_eq!(spec.column, "e.NroCorte");
    }

    #[test]
    fn blank_estado_is_not_a_filter() {
        let q = ListQuery {
            estado: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(q.estado(), None);
    }
}
