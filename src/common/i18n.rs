// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "es";

// Mensajes de error por idioma. El español es el idioma canónico: cualquier
// clave o idioma desconocido cae en la tabla "es".
const ES: &[(&str, &str)] = &[
    ("validation", "Uno o más campos son inválidos."),
    ("missing_fields", "Faltan campos requeridos: {fields}."),
    ("not_found", "{entity} no encontrado: {key}."),
    ("duplicate_corte", "El NroCorte '{corte}' ya existe."),
    ("open_entry_exists", "Ya existe una entrada en estado Abierto (N° {numero})."),
    ("conflict", "Ya existe un registro con ese valor: {what}."),
    ("in_use", "No se puede eliminar: {what} está referenciado por otros registros."),
    ("entry_without_details", "No se puede cerrar la entrada {numero} sin detalle."),
    (
        "insufficient_stock",
        "Stock insuficiente para el producto {product}: disponible {available}, solicitado {requested}.",
    ),
    (
        "stock_reversal_underflow",
        "No se puede revertir el stock del producto {product}: disponible {available}, a revertir {reverted}.",
    ),
    ("invalid_credentials", "Legajo o contraseña incorrectos."),
    ("inactive_user", "El usuario está inactivo."),
    ("wrong_current_password", "La contraseña actual es incorrecta."),
    ("invalid_json", "El cuerpo de la solicitud es inválido: {reason}"),
    ("internal", "Ocurrió un error inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("validation", "One or more fields are invalid."),
    ("missing_fields", "Missing required fields: {fields}."),
    ("not_found", "{entity} not found: {key}."),
    ("duplicate_corte", "Cut number '{corte}' already exists."),
    ("open_entry_exists", "There is already an open entry (#{numero})."),
    ("conflict", "A record with that value already exists: {what}."),
    ("in_use", "Cannot delete: {what} is referenced by other records."),
    ("entry_without_details", "Entry {numero} cannot be closed without detail lines."),
    (
        "insufficient_stock",
        "Insufficient stock for product {product}: available {available}, requested {requested}.",
    ),
    (
        "stock_reversal_underflow",
        "Cannot revert stock for product {product}: available {available}, to revert {reverted}.",
    ),
    ("invalid_credentials", "Invalid employee id or password."),
    ("inactive_user", "The user is inactive."),
    ("wrong_current_password", "The current password is incorrect."),
    ("invalid_json", "Invalid request body: {reason}"),
    ("internal", "An unexpected error occurred."),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("es", ES.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());
        Self { messages }
    }

    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.messages.get(lang).and_then(|table| table.get(key)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders() {
        let store = I18nStore::new();
        let msg = store.translate("es", "duplicate_corte", &[("corte", "C-100".into())]);
        assert_eq!(msg, "El NroCorte 'C-100' ya existe.");
    }

    #[test]
    fn unknown_language_falls_back_to_spanish() {
        let store = I18nStore::new();
        let msg = store.translate("pt", "inactive_user", &[]);
        assert_eq!(msg, "El usuario está inactivo.");
    }

    #[test]
    fn english_is_available() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "inactive_user", &[]), "The user is inactive.");
    }

    #[test]
    fn both_tables_share_keys() {
        let es: Vec<_> = ES.iter().map(|(k, _)| *k).collect();
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        assert_eq!(es, en);
    }
}
