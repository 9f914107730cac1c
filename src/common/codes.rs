// src/common/codes.rs

// Códigos secuenciales de catálogo: pr001, mq001, si001...

pub const PRODUCTO_PREFIX: &str = "pr";
pub const MAQUINA_PREFIX: &str = "mq";
pub const SILO_PREFIX: &str = "si";

/// Siguiente código para `prefix` dado el mayor número ya emitido.
/// Se rellena a 3 dígitos; a partir de 1000 simplemente crece.
pub fn next_code(prefix: &str, last_number: Option<i64>) -> String {
    let next = last_number.unwrap_or(0).max(0) + 1;
    format!("{prefix}{next:03}")
}

/// SQL que obtiene el mayor número emitido para un prefijo en `column`.
/// Ignora códigos que no respetan el formato (p. ej. cargados a mano).
pub fn max_number_sql(table: &str, column: &str) -> String {
    format!(
        "SELECT MAX(CAST(SUBSTR({column}, 3) AS INTEGER)) FROM {table} \
         WHERE {column} LIKE ? AND SUBSTR({column}, 3) GLOB '[0-9]*'"
    )
}

pub fn like_prefix(prefix: &str) -> String {
    format!("{prefix}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_code_starts_at_one() {
        assert_eq!(next_code(PRODUCTO_PREFIX, None), "pr001");
    }

    #[test]
    fn pads_and_grows() {
        assert_eq!(next_code(MAQUINA_PREFIX, Some(9)), "mq010");
        assert_eq!(next_code(SILO_PREFIX, Some(999)), "si1000");
    }
}
