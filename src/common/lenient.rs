// src/common/lenient.rs

// Los formularios mandan cantidades y series a veces como número y a veces
// como texto ("50"). Estos deserializadores aceptan ambos.

use serde::{de::Error, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Int(n)) => Ok(Some(n as f64)),
        Some(NumberOrText::Float(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("'{s}' no es un número válido"))),
    }
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Int(n)) => Ok(Some(n)),
        Some(NumberOrText::Float(n)) if n.fract() == 0.0 => Ok(Some(n as i64)),
        Some(NumberOrText::Float(n)) => Err(D::Error::custom(format!("{n} no es un entero"))),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("'{s}' no es un entero válido"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Line {
        #[serde(default, deserialize_with = "opt_f64")]
        cantidad: Option<f64>,
        #[serde(default, deserialize_with = "opt_i64")]
        serie: Option<i64>,
    }

    #[test]
    fn accepts_numbers_and_numeric_text() {
        let line: Line = serde_json::from_str(r#"{"cantidad": "12,5", "serie": "7"}"#).unwrap();
        assert_eq!(line.cantidad, Some(12.5));
        assert_eq!(line.serie, Some(7));

        let line: Line = serde_json::from_str(r#"{"cantidad": 50, "serie": 8}"#).unwrap();
        assert_eq!(line.cantidad, Some(50.0));
        assert_eq!(line.serie, Some(8));
    }

    #[test]
    fn missing_or_blank_is_none() {
        let line: Line = serde_json::from_str(r#"{"cantidad": ""}"#).unwrap();
        assert_eq!(line.cantidad, None);
        assert_eq!(line.serie, None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Line>(r#"{"cantidad": "mucho"}"#).is_err());
    }
}
